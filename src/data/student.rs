use crate::{
    data::DataType,
    error::{
        AlunoResult, BlankFieldSnafu, EmptyUpdateSnafu, InsertStudentSnafu, InvalidEmailSnafu,
        ListStudentsSnafu, MissingStudentSnafu, NoInsertedIdSnafu, RemoveStudentSnafu,
        UpdateStudentSnafu,
    },
    state::AlunoState,
    store::{BsonDecodeSnafu, BsonEncodeSnafu, InvalidIdentifierSnafu, StoreResult},
};
use email_address::EmailAddress;
use jiff::civil::Date;
use mongodb::bson::{
    from_document, oid::ObjectId, serde_helpers::serialize_object_id_as_hex_string, to_document,
};
use serde::{Deserialize, Serialize};
use snafu::{OptionExt, ResultExt};

///A stored student. Read from the `alunos` collection, written back out as JSON with `id` as a hex string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    #[serde(
        rename(deserialize = "_id"),
        serialize_with = "serialize_object_id_as_hex_string"
    )]
    pub id: ObjectId,
    pub first_name: String,
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<Date>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub mobile_phone: String,
}

///Body for creating a student. The id always comes from the database, so supplying one is an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewStudent {
    pub first_name: String,
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<Date>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub mobile_phone: String,
}

///Body for updating a student. Only the fields that are present get overwritten.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct StudentPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<Date>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile_phone: Option<String>,
}

fn ensure_not_blank(value: &str, field: &'static str) -> AlunoResult<()> {
    snafu::ensure!(!value.trim().is_empty(), BlankFieldSnafu { field });
    Ok(())
}

fn ensure_valid_email(email: Option<&str>) -> AlunoResult<()> {
    if let Some(email) = email {
        snafu::ensure!(EmailAddress::is_valid(email), InvalidEmailSnafu { email });
    }
    Ok(())
}

fn parse_id(id: &str) -> StoreResult<ObjectId> {
    ObjectId::parse_str(id).context(InvalidIdentifierSnafu { original: id })
}

impl NewStudent {
    pub fn validate(&self) -> AlunoResult<()> {
        ensure_not_blank(&self.first_name, "firstName")?;
        ensure_not_blank(&self.last_name, "lastName")?;
        ensure_not_blank(&self.mobile_phone, "mobilePhone")?;
        ensure_valid_email(self.email.as_deref())
    }
}

impl StudentPatch {
    pub const fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.birth_date.is_none()
            && self.address.is_none()
            && self.email.is_none()
            && self.mobile_phone.is_none()
    }

    pub fn validate(&self) -> AlunoResult<()> {
        snafu::ensure!(!self.is_empty(), EmptyUpdateSnafu);

        if let Some(first_name) = &self.first_name {
            ensure_not_blank(first_name, "firstName")?;
        }
        if let Some(last_name) = &self.last_name {
            ensure_not_blank(last_name, "lastName")?;
        }
        if let Some(mobile_phone) = &self.mobile_phone {
            ensure_not_blank(mobile_phone, "mobilePhone")?;
        }
        ensure_valid_email(self.email.as_deref())
    }
}

impl DataType for Student {
    const COLLECTION: &'static str = "alunos";
    type FormForAdding = NewStudent;
    type FormForUpdating = StudentPatch;

    async fn get_all(state: &AlunoState) -> AlunoResult<Vec<Self>> {
        let handle = state.get_handle().await.context(ListStudentsSnafu)?;

        handle
            .find_all(Self::COLLECTION)
            .await
            .context(ListStudentsSnafu)?
            .into_iter()
            .map(|document| {
                let id = document.get_object_id("_id").ok();
                from_document(document).context(BsonDecodeSnafu { id })
            })
            .collect::<StoreResult<Vec<_>>>()
            .context(ListStudentsSnafu)
    }

    async fn insert_into_database(
        to_be_added: Self::FormForAdding,
        state: &AlunoState,
    ) -> AlunoResult<ObjectId> {
        to_be_added.validate()?;
        let document = to_document(&to_be_added)
            .context(BsonEncodeSnafu)
            .context(InsertStudentSnafu)?;

        let handle = state.get_handle().await.context(InsertStudentSnafu)?;
        let id = handle
            .insert_one(Self::COLLECTION, document)
            .await
            .context(InsertStudentSnafu)?
            .context(NoInsertedIdSnafu)?;

        info!(%id, "Added student");
        Ok(id)
    }

    async fn remove_from_database(id: &str, state: &AlunoState) -> AlunoResult<()> {
        let id = parse_id(id).context(RemoveStudentSnafu)?;

        let handle = state.get_handle().await.context(RemoveStudentSnafu)?;
        let deleted = handle
            .delete_one(Self::COLLECTION, id)
            .await
            .context(RemoveStudentSnafu)?;
        snafu::ensure!(deleted > 0, MissingStudentSnafu { id });

        info!(%id, "Removed student");
        Ok(())
    }

    async fn update_in_database(
        id: &str,
        to_be_updated: Self::FormForUpdating,
        state: &AlunoState,
    ) -> AlunoResult<()> {
        let id = parse_id(id).context(UpdateStudentSnafu)?;
        to_be_updated.validate()?;
        let fields = to_document(&to_be_updated)
            .context(BsonEncodeSnafu)
            .context(UpdateStudentSnafu)?;

        let handle = state.get_handle().await.context(UpdateStudentSnafu)?;
        let matched = handle
            .update_one(Self::COLLECTION, id, fields)
            .await
            .context(UpdateStudentSnafu)?;
        snafu::ensure!(matched > 0, MissingStudentSnafu { id });

        info!(%id, "Updated student");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::RuntimeConfiguration, error::AlunoError, store::StoreError,
        store::memory::MemoryConnector,
    };
    use std::sync::Arc;

    fn state() -> AlunoState {
        AlunoState::with_connector(
            Arc::new(MemoryConnector::default()),
            RuntimeConfiguration::in_memory("escola"),
        )
    }

    fn ana() -> NewStudent {
        NewStudent {
            first_name: "Ana".into(),
            last_name: "Silva".into(),
            birth_date: Some(jiff::civil::date(2004, 3, 17)),
            address: None,
            email: Some("ana.silva@escola.br".into()),
            mobile_phone: "11999999999".into(),
        }
    }

    #[tokio::test]
    async fn created_student_is_listed() {
        let state = state();
        let input = ana();

        let id = Student::insert_into_database(input.clone(), &state)
            .await
            .unwrap();
        let all = Student::get_all(&state).await.unwrap();

        assert_eq!(
            all,
            vec![Student {
                id,
                first_name: input.first_name,
                last_name: input.last_name,
                birth_date: input.birth_date,
                address: input.address,
                email: input.email,
                mobile_phone: input.mobile_phone,
            }]
        );
    }

    #[tokio::test]
    async fn list_follows_creation_order() {
        let state = state();
        let mut bruno = ana();
        bruno.first_name = "Bruno".into();

        let first = Student::insert_into_database(ana(), &state).await.unwrap();
        let second = Student::insert_into_database(bruno, &state).await.unwrap();

        let ids: Vec<_> = Student::get_all(&state)
            .await
            .unwrap()
            .into_iter()
            .map(|student| student.id)
            .collect();
        assert_eq!(ids, vec![first, second]);
    }

    #[tokio::test]
    async fn remove_succeeds_exactly_once() {
        let state = state();
        let id = Student::insert_into_database(ana(), &state).await.unwrap();

        Student::remove_from_database(&id.to_hex(), &state)
            .await
            .unwrap();
        let err = Student::remove_from_database(&id.to_hex(), &state)
            .await
            .unwrap_err();

        assert!(matches!(err, AlunoError::MissingStudent { id: missing } if missing == id));
        assert!(Student::get_all(&state).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn absent_ids_are_not_found() {
        let state = state();
        let absent = "000000000000000000000000";

        let removed = Student::remove_from_database(absent, &state).await;
        let updated = Student::update_in_database(
            absent,
            StudentPatch {
                address: Some("Rua das Flores, 10".into()),
                ..StudentPatch::default()
            },
            &state,
        )
        .await;

        assert!(matches!(removed, Err(AlunoError::MissingStudent { .. })));
        assert!(matches!(updated, Err(AlunoError::MissingStudent { .. })));
    }

    #[tokio::test]
    async fn update_only_touches_given_fields() {
        let state = state();
        let id = Student::insert_into_database(ana(), &state).await.unwrap();

        Student::update_in_database(
            &id.to_hex(),
            StudentPatch {
                last_name: Some("Souza".into()),
                address: Some("Rua das Flores, 10".into()),
                ..StudentPatch::default()
            },
            &state,
        )
        .await
        .unwrap();

        let all = Student::get_all(&state).await.unwrap();
        let expected = ana();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, id);
        assert_eq!(all[0].first_name, expected.first_name);
        assert_eq!(all[0].last_name, "Souza");
        assert_eq!(all[0].birth_date, expected.birth_date);
        assert_eq!(all[0].address.as_deref(), Some("Rua das Flores, 10"));
        assert_eq!(all[0].email, expected.email);
        assert_eq!(all[0].mobile_phone, expected.mobile_phone);
    }

    #[tokio::test]
    async fn malformed_id_is_a_storage_error() {
        let state = state();

        let err = Student::update_in_database(
            "not-an-id",
            StudentPatch {
                first_name: Some("Ana".into()),
                ..StudentPatch::default()
            },
            &state,
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            AlunoError::UpdateStudent {
                source: StoreError::InvalidIdentifier { .. }
            }
        ));
    }

    #[tokio::test]
    async fn blank_required_fields_are_rejected() {
        let state = state();
        let mut input = ana();
        input.mobile_phone = "   ".into();

        let err = Student::insert_into_database(input, &state)
            .await
            .unwrap_err();

        assert!(matches!(err, AlunoError::BlankField { field: "mobilePhone" }));
        assert!(Student::get_all(&state).await.unwrap().is_empty());
    }

    #[test]
    fn invalid_email_is_rejected() {
        let mut input = ana();
        input.email = Some("not an email".into());
        assert!(matches!(
            input.validate(),
            Err(AlunoError::InvalidEmail { .. })
        ));

        let patch = StudentPatch {
            email: Some("@".into()),
            ..StudentPatch::default()
        };
        assert!(matches!(
            patch.validate(),
            Err(AlunoError::InvalidEmail { .. })
        ));
    }

    #[test]
    fn empty_patch_is_rejected() {
        assert!(matches!(
            StudentPatch::default().validate(),
            Err(AlunoError::EmptyUpdate)
        ));
    }

    #[test]
    fn bodies_cannot_carry_an_id() {
        let with_id = r#"{"id": "000000000000000000000000", "firstName": "Ana", "lastName": "Silva", "mobilePhone": "11999999999"}"#;
        let with_mongo_id = r#"{"_id": "000000000000000000000000", "lastName": "Souza"}"#;

        assert!(serde_json::from_str::<NewStudent>(with_id).is_err());
        assert!(serde_json::from_str::<StudentPatch>(with_mongo_id).is_err());
    }

    #[tokio::test]
    async fn undecodable_record_is_named_in_the_error() {
        let state = state();
        Student::insert_into_database(ana(), &state).await.unwrap();
        let broken = state
            .get_handle()
            .await
            .unwrap()
            .insert_one(Student::COLLECTION, mongodb::bson::doc! { "firstName": "Sem Sobrenome" })
            .await
            .unwrap()
            .unwrap();

        let err = Student::get_all(&state).await.unwrap_err();

        assert!(matches!(
            err,
            AlunoError::ListStudents {
                source: StoreError::BsonDecode { id: Some(id), .. }
            } if id == broken
        ));
    }

    #[test]
    fn json_uses_camel_case_and_hex_ids() {
        let id = ObjectId::new();
        let student = Student {
            id,
            first_name: "Ana".into(),
            last_name: "Silva".into(),
            birth_date: Some(jiff::civil::date(2004, 3, 17)),
            address: None,
            email: None,
            mobile_phone: "11999999999".into(),
        };

        let json = serde_json::to_value(&student).unwrap();
        assert_eq!(json["id"], id.to_hex());
        assert_eq!(json["firstName"], "Ana");
        assert_eq!(json["birthDate"], "2004-03-17");
        assert!(json.get("address").is_none());
    }
}
