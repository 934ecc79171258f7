use crate::{
    routes::students::{delete_student, get_students, post_new_student, put_student_update},
    state::AlunoState,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, put},
};
use tower_http::{compression::CompressionLayer, trace::TraceLayer};

pub mod students;

//bodies over this are reported through `JsonRejection`
pub const MAX_BODY_BYTES: usize = 64 * 1024;

pub fn router(state: AlunoState) -> Router {
    Router::new()
        .route("/alunos", get(get_students).post(post_new_student))
        .route(
            "/alunos/{id}",
            put(put_student_update).delete(delete_student),
        )
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
