use crate::data_stores::sqlite::errors::SqliteError;

/// Error state left behind by the most recent operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationOutcome {
    /// set at construction when the database file is missing, never cleared
    pub general_error: bool,
    pub sql_error: bool,
    pub sql_error_message: String,
    pub sql_error_code: i32,
}

impl OperationOutcome {
    pub(crate) fn disable(&mut self, err: &SqliteError) {
        self.general_error = true;
        self.capture(err);
    }

    pub(crate) fn begin(&mut self) {
        self.sql_error = false;
    }

    pub(crate) fn fail(&mut self, err: &SqliteError) {
        self.sql_error = true;
        self.capture(err);
    }

    fn capture(&mut self, err: &SqliteError) {
        self.sql_error_message = err.to_string();
        self.sql_error_code = err.code();
    }

    pub fn is_ok(&self) -> bool {
        !self.general_error && !self.sql_error
    }
}
