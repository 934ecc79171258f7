use crate::error::AlunoResult;
use crate::state::AlunoState;
use mongodb::bson::oid::ObjectId;

pub mod student;

///A record type living in its own collection. Every operation opens one handle and makes one storage call.
pub trait DataType: Sized {
    const COLLECTION: &'static str;
    type FormForAdding;
    type FormForUpdating;

    async fn get_all(state: &AlunoState) -> AlunoResult<Vec<Self>>;
    async fn insert_into_database(
        to_be_added: Self::FormForAdding,
        state: &AlunoState,
    ) -> AlunoResult<ObjectId>;
    async fn remove_from_database(id: &str, state: &AlunoState) -> AlunoResult<()>;
    async fn update_in_database(
        id: &str,
        to_be_updated: Self::FormForUpdating,
        state: &AlunoState,
    ) -> AlunoResult<()>;
}
