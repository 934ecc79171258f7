use crate::{
    data::{
        DataType,
        student::{NewStudent, Student, StudentPatch},
    },
    error::{AlunoResult, InvalidBodySnafu},
    state::AlunoState,
};
use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};
use snafu::ResultExt;

pub async fn get_students(State(state): State<AlunoState>) -> AlunoResult<Json<Vec<Student>>> {
    Ok(Json(Student::get_all(&state).await?))
}

pub async fn post_new_student(
    State(state): State<AlunoState>,
    body: Result<Json<NewStudent>, JsonRejection>,
) -> AlunoResult<Json<String>> {
    let Json(new_student) = body.context(InvalidBodySnafu)?;
    let id = Student::insert_into_database(new_student, &state).await?;
    Ok(Json(format!("Aluno cadastrado com sucesso. ID: {id}")))
}

pub async fn delete_student(
    State(state): State<AlunoState>,
    Path(id): Path<String>,
) -> AlunoResult<Json<String>> {
    Student::remove_from_database(&id, &state).await?;
    Ok(Json("Aluno removido com sucesso".to_string()))
}

pub async fn put_student_update(
    State(state): State<AlunoState>,
    Path(id): Path<String>,
    body: Result<Json<StudentPatch>, JsonRejection>,
) -> AlunoResult<Json<String>> {
    let Json(patch) = body.context(InvalidBodySnafu)?;
    Student::update_in_database(&id, patch, &state).await?;
    Ok(Json("Cadastro atualizado com sucesso".to_string()))
}
