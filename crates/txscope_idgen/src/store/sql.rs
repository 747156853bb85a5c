//! SQL sequence store over a core connection source.

use crate::error::{IdError, IdResult};
use crate::store::{SequenceName, SequenceStore};
use std::sync::Arc;
use tracing::{debug, warn};
use txscope_core::{Connection, ConnectionSource};

/// Statement templates for one database vendor.
///
/// Templates may use these placeholders:
///
/// | Placeholder   | Replaced with                                   |
/// |---------------|-------------------------------------------------|
/// | `{schema}`    | the sequence schema or the dialect default      |
/// | `{name}`      | the unqualified sequence name                   |
/// | `{qualified}` | `schema.name`, or `name` when there is no schema |
/// | `{start}`     | the start value                                 |
/// | `{increment}` | the increment                                   |
///
/// The existence check must yield a scalar of 1 when the sequence exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceDialect {
    /// Schema used when the sequence configuration names none.
    pub default_schema: Option<String>,
    /// Existence check.
    pub exists: String,
    /// Sequence creation.
    pub create: String,
    /// Atomic next-value read.
    pub next_value: String,
}

impl SequenceDialect {
    /// Creates a dialect from custom templates.
    pub fn custom(
        exists: impl Into<String>,
        create: impl Into<String>,
        next_value: impl Into<String>,
    ) -> Self {
        Self {
            default_schema: None,
            exists: exists.into(),
            create: create.into(),
            next_value: next_value.into(),
        }
    }

    /// Sets the default schema.
    #[must_use]
    pub fn with_default_schema(mut self, schema: impl Into<String>) -> Self {
        self.default_schema = Some(schema.into());
        self
    }

    /// PostgreSQL, default schema `public`.
    pub fn postgres() -> Self {
        Self::custom(
            "SELECT count(*) FROM information_schema.sequences \
             WHERE sequence_name = '{name}' AND sequence_schema = '{schema}'",
            "CREATE SEQUENCE {qualified} START WITH {start} INCREMENT BY {increment}",
            "SELECT nextval('{qualified}')",
        )
        .with_default_schema("public")
    }

    /// Microsoft SQL Server, default schema `dbo`.
    pub fn mssql() -> Self {
        Self::custom(
            "SELECT count(*) FROM sys.sequences seq \
             JOIN sys.schemas s ON s.schema_id = seq.schema_id \
             WHERE seq.name = '{name}' AND s.name = '{schema}'",
            "CREATE SEQUENCE [{schema}].[{name}] START WITH {start} INCREMENT BY {increment}",
            "SELECT NEXT VALUE FOR {qualified}",
        )
        .with_default_schema("dbo")
    }

    /// Oracle. Without a schema the sequence lives in the user's schema.
    pub fn oracle() -> Self {
        Self::custom(
            "SELECT count(*) FROM user_sequences WHERE sequence_name = '{name}'",
            "CREATE SEQUENCE {qualified} START WITH {start} INCREMENT BY {increment}",
            "SELECT {qualified}.NEXTVAL FROM dual",
        )
    }

    fn render(&self, template: &str, sequence: &SequenceName, start: i64, increment: i64) -> String {
        let schema = sequence.schema().or(self.default_schema.as_deref());
        let qualified = match schema {
            Some(schema) => format!("{schema}.{}", sequence.name()),
            None => sequence.name().to_string(),
        };
        template
            .replace("{schema}", schema.unwrap_or_default())
            .replace("{name}", sequence.name())
            .replace("{qualified}", &qualified)
            .replace("{start}", &start.to_string())
            .replace("{increment}", &increment.to_string())
    }
}

/// Runs dialect statements on a fresh connection per call.
///
/// Connections are opened outside any operation scope, so sequence reads
/// never join a business transaction.
pub struct SqlSequenceStore<S: ConnectionSource + ?Sized> {
    source: Arc<S>,
    dialect: SequenceDialect,
}

impl<S: ConnectionSource + ?Sized> SqlSequenceStore<S> {
    /// Creates a store.
    pub fn new(source: Arc<S>, dialect: SequenceDialect) -> Self {
        Self { source, dialect }
    }

    /// Returns the dialect.
    pub fn dialect(&self) -> &SequenceDialect {
        &self.dialect
    }

    /// Opens a connection, runs `f` and closes the connection on every path.
    fn with_connection<R>(
        &self,
        f: impl FnOnce(&mut dyn Connection) -> IdResult<R>,
    ) -> IdResult<R> {
        let mut connection = self.source.create()?;
        connection.open()?;
        let result = f(connection.as_mut());
        if let Err(error) = connection.close() {
            warn!(error = %error, "Failed to close sequence connection");
        }
        result
    }
}

impl<S: ConnectionSource + ?Sized> SequenceStore for SqlSequenceStore<S> {
    fn exists(&self, sequence: &SequenceName) -> IdResult<bool> {
        let statement = self.dialect.render(&self.dialect.exists, sequence, 0, 0);
        self.with_connection(|c| Ok(c.query_scalar(&statement)? == Some(1)))
    }

    fn create(&self, sequence: &SequenceName, start_with: i64, increment: i64) -> IdResult<()> {
        let statement = self
            .dialect
            .render(&self.dialect.create, sequence, start_with, increment);
        debug!(statement = %statement, "Creating sequence");
        self.with_connection(|c| {
            c.execute(&statement)?;
            Ok(())
        })
    }

    fn next_value(&self, sequence: &SequenceName) -> IdResult<Option<i64>> {
        let statement = self.dialect.render(&self.dialect.next_value, sequence, 0, 0);
        self.with_connection(|c| c.query_scalar(&statement).map_err(IdError::from))
    }
}
