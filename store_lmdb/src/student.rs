//! LMDB implementation of StudentStore.

use boostly_store::{Student, StudentStore, StoreError};
use boostly_types::StudentId;

use crate::keys::{decode, id_bytes};
use crate::{LmdbError, LmdbStore};

impl StudentStore for LmdbStore {
    fn get_student(&self, id: &StudentId) -> Result<Option<Student>, StoreError> {
        let rtxn = self.env.read_txn()?;
        let student = self
            .env
            .students_db
            .get(&rtxn, id.as_bytes())
            .map_err(LmdbError::from)?
            .map(decode)
            .transpose()?;
        Ok(student)
    }

    fn get_student_by_roll(&self, roll_identifier: &str) -> Result<Option<Student>, StoreError> {
        let rtxn = self.env.read_txn()?;
        let Some(id) = self
            .env
            .student_rolls_db
            .get(&rtxn, roll_identifier.as_bytes())
            .map_err(LmdbError::from)?
        else {
            return Ok(None);
        };
        let id = id_bytes(id)?;
        let val = self
            .env
            .students_db
            .get(&rtxn, &id)
            .map_err(LmdbError::from)?
            .ok_or_else(|| {
                LmdbError::Corruption(format!("roll '{roll_identifier}' points at a missing student"))
            })?;
        Ok(Some(decode(val)?))
    }

    fn iter_students(&self) -> Result<Vec<Student>, StoreError> {
        let rtxn = self.env.read_txn()?;
        let mut students = Vec::new();
        for item in self.env.students_db.iter(&rtxn).map_err(LmdbError::from)? {
            let (_, val) = item.map_err(LmdbError::from)?;
            students.push(decode::<Student>(val)?);
        }
        students.sort_by(|a, b| {
            a.display_name
                .cmp(&b.display_name)
                .then_with(|| a.roll_identifier.cmp(&b.roll_identifier))
        });
        Ok(students)
    }

    fn student_count(&self) -> Result<u64, StoreError> {
        let rtxn = self.env.read_txn()?;
        Ok(self.env.students_db.len(&rtxn).map_err(LmdbError::from)?)
    }
}
