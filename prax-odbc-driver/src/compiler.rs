//! SQL Server insert compilation.
//!
//! The base compiler appends `OUTPUT INSERTED.*` to every insert so the inserted row
//! comes back. Some ODBC drivers reject that clause; [`NoOutputCompiler`] drops it
//! when `useInsertOutput` is disabled.

/// Clause appended to inserts by [`SqlServerCompiler`].
pub const INSERT_OUTPUT_CLAUSE: &str = " OUTPUT INSERTED.*";

/// Builds the insert fragment of a query.
pub trait QueryCompiler: Send + Sync {
    /// Render `INSERT INTO <table> (<columns>)` plus any trailing clause.
    fn build_insert_part(&self, table: &str, columns: &[&str]) -> String;
}

/// Base SQL Server compiler.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlServerCompiler;

impl QueryCompiler for SqlServerCompiler {
    fn build_insert_part(&self, table: &str, columns: &[&str]) -> String {
        format!(
            "INSERT INTO {} ({}){}",
            table,
            columns.join(", "),
            INSERT_OUTPUT_CLAUSE
        )
    }
}

/// Wraps a compiler and strips the trailing output clause from inserts.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOutputCompiler<C = SqlServerCompiler> {
    inner: C,
}

impl<C: QueryCompiler> NoOutputCompiler<C> {
    /// Wrap `inner`.
    pub fn new(inner: C) -> Self {
        Self { inner }
    }
}

impl<C: QueryCompiler> QueryCompiler for NoOutputCompiler<C> {
    fn build_insert_part(&self, table: &str, columns: &[&str]) -> String {
        let insert = self.inner.build_insert_part(table, columns);
        match insert.strip_suffix(INSERT_OUTPUT_CLAUSE) {
            Some(trimmed) => trimmed.to_string(),
            None => insert,
        }
    }
}

/// Pick the compiler for a connection's `useInsertOutput` setting.
pub fn compiler_for(use_insert_output: bool) -> Box<dyn QueryCompiler> {
    if use_insert_output {
        Box::new(SqlServerCompiler)
    } else {
        Box::new(NoOutputCompiler::new(SqlServerCompiler))
    }
}
