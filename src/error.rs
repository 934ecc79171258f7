use crate::store::StoreError;
use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use mongodb::bson::oid::ObjectId;
use snafu::Snafu;

pub type AlunoResult<T> = Result<T, AlunoError>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum AlunoError {
    #[snafu(display("Erro ao conectar ao banco de dados"))]
    OpenDatabase { source: mongodb::error::Error },
    #[snafu(display("Unable to retrieve env var `{}`", name))]
    BadEnvVar {
        source: dotenvy::Error,
        name: &'static str,
    },
    #[snafu(display("Unknown storage backend {:?}, expected `mongodb` or `memory`", found))]
    UnknownStorageBackend { found: String },
    #[snafu(display("`MONGODB_URI` must be set when using the `mongodb` storage backend"))]
    MissingMongoUri,
    #[snafu(display("Erro ao recuperar as informações do Aluno"))]
    ListStudents { source: StoreError },
    #[snafu(display("Erro ao cadastrar o aluno"))]
    InsertStudent { source: StoreError },
    #[snafu(display("Não foi possível cadastrar o aluno no banco de dados"))]
    NoInsertedId,
    #[snafu(display("Erro ao remover o aluno"))]
    RemoveStudent { source: StoreError },
    #[snafu(display("Erro ao atualizar o aluno"))]
    UpdateStudent { source: StoreError },
    #[snafu(display("Aluno não encontrado"))]
    MissingStudent { id: ObjectId },
    #[snafu(display("Dados do aluno inválidos: {}", source.body_text()))]
    InvalidBody { source: JsonRejection },
    #[snafu(display("O campo `{}` é obrigatório", field))]
    BlankField { field: &'static str },
    #[snafu(display("Email inválido: {:?}", email))]
    InvalidEmail { email: String },
    #[snafu(display("Nenhum campo para atualizar"))]
    EmptyUpdate,
}

impl IntoResponse for AlunoError {
    #[allow(clippy::match_same_arms)]
    fn into_response(self) -> Response {
        const ISE: StatusCode = StatusCode::INTERNAL_SERVER_ERROR; //internal server error
        const NF: StatusCode = StatusCode::NOT_FOUND; //not found
        const BI: StatusCode = StatusCode::BAD_REQUEST; //bad input

        let status_code = match &self {
            Self::OpenDatabase { .. } | Self::BadEnvVar { .. } => ISE,
            Self::UnknownStorageBackend { .. } | Self::MissingMongoUri => ISE,
            //reads and inserts report every failure as bad input, removes and updates don't
            Self::ListStudents { .. } | Self::InsertStudent { .. } => BI,
            Self::NoInsertedId => BI,
            Self::RemoveStudent { .. } | Self::UpdateStudent { .. } => ISE,
            Self::MissingStudent { .. } => NF,
            Self::InvalidBody { .. } => BI,
            Self::BlankField { .. } | Self::InvalidEmail { .. } | Self::EmptyUpdate => BI,
        };

        error!(?self, "Error!");
        (status_code, Json(self.to_string())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::UnavailableSnafu;
    use snafu::IntoError;

    fn unavailable() -> StoreError {
        UnavailableSnafu {
            database: "escola",
        }
        .build()
    }

    #[test]
    fn storage_failures_depend_on_operation() {
        let list = ListStudentsSnafu.into_error(unavailable()).into_response();
        let insert = InsertStudentSnafu.into_error(unavailable()).into_response();
        let remove = RemoveStudentSnafu.into_error(unavailable()).into_response();
        let update = UpdateStudentSnafu.into_error(unavailable()).into_response();

        assert_eq!(list.status(), StatusCode::BAD_REQUEST);
        assert_eq!(insert.status(), StatusCode::BAD_REQUEST);
        assert_eq!(remove.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(update.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn client_message_hides_source() {
        let err = RemoveStudentSnafu.into_error(unavailable());
        assert_eq!(err.to_string(), "Erro ao remover o aluno");
    }

    #[test]
    fn missing_student_is_not_found() {
        let response = AlunoError::MissingStudent { id: ObjectId::new() }.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
