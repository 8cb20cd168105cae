//! Student storage trait.

use crate::StoreError;
use boostly_types::{StudentId, Timestamp};
use serde::{Deserialize, Serialize};

/// A student known to the ledger.
///
/// `roll_identifier` is unique across the table and never changes after
/// onboarding; only `display_name` and `email` may be edited.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    pub display_name: String,
    pub roll_identifier: String,
    pub email: Option<String>,
    pub created_at: Timestamp,
}

/// Read access to the `students` table.
pub trait StudentStore {
    fn get_student(&self, id: &StudentId) -> Result<Option<Student>, StoreError>;
    fn get_student_by_roll(&self, roll_identifier: &str) -> Result<Option<Student>, StoreError>;

    /// All students, ordered by display name.
    fn iter_students(&self) -> Result<Vec<Student>, StoreError>;

    fn student_count(&self) -> Result<u64, StoreError> {
        self.iter_students().map(|v| v.len() as u64)
    }
}
