//! Defines the multipart endpoint for attaching a file to a transaction.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Multipart, Path, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::{Session, current_org_member},
    ids::TransactionId,
    media_store::MediaStore,
    transaction::{
        attachment::{AttachmentDescriptor, create_attachment},
        core::get_transaction,
    },
};

/// The state needed to store an attachment.
#[derive(Debug, Clone)]
pub struct UploadAttachmentState {
    /// The database connection for recording attachments.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The blob store holding the attachment bytes.
    pub media_store: MediaStore,
}

impl FromRef<AppState> for UploadAttachmentState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            media_store: state.media_store.clone(),
        }
    }
}

/// The file pulled out of the multipart form.
struct UploadedFile {
    name: String,
    content_type: String,
    bytes: Vec<u8>,
}

/// A route handler for uploading a file and attaching it to a transaction.
///
/// The caller must belong to the organization owning the transaction;
/// anything else is rejected before any write. On success the bytes are
/// stored under `{org}/transactions/{transaction}/{nanos}-{name}` and a
/// JSON descriptor of the attachment is returned.
///
/// Storing the bytes and recording the row form a small saga: if the
/// database insert fails, the stored object is deleted again so a failed
/// request leaves no orphaned file.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn upload_attachment_endpoint(
    State(state): State<UploadAttachmentState>,
    Path(transaction_id): Path<TransactionId>,
    Extension(session): Extension<Session>,
    multipart: Multipart,
) -> Response {
    // Authorization first: resolve the member and check the transaction is
    // theirs before touching the upload.
    let org_id = {
        let connection = state
            .db_connection
            .lock()
            .expect("Could not acquire database lock");

        let member = match current_org_member(&session, &connection) {
            Ok(member) => member,
            Err(error) => return error.into_alert_response(),
        };

        if let Err(error) = get_transaction(&member.org_id, &transaction_id, &connection) {
            return error.into_alert_response();
        }

        member.org_id
    };

    let file = match extract_file(multipart).await {
        Ok(file) => file,
        Err(error) => return error.into_alert_response(),
    };

    let storage_key = MediaStore::attachment_key(&org_id, &transaction_id, &file.name);

    if let Err(error) = state.media_store.put(&storage_key, &file.bytes) {
        tracing::error!("could not store attachment: {error}");
        return error.into_alert_response();
    }

    let connection = state
        .db_connection
        .lock()
        .expect("Could not acquire database lock");

    let attachment = match create_attachment(
        &transaction_id,
        &file.name,
        &file.content_type,
        file.bytes.len() as i64,
        &storage_key,
        &connection,
    ) {
        Ok(attachment) => attachment,
        Err(error) => {
            // Roll the stored object back so the failed request leaves no
            // orphaned file behind.
            if let Err(cleanup_error) = state.media_store.delete(&storage_key) {
                tracing::error!(
                    "could not clean up stored object {storage_key} after failed insert: \
                     {cleanup_error}"
                );
            }
            tracing::error!("could not record attachment: {error}");
            return error.into_alert_response();
        }
    };

    Json(AttachmentDescriptor::from(&attachment)).into_response()
}

/// Pull the field named `file` out of the multipart form.
async fn extract_file(mut multipart: Multipart) -> Result<UploadedFile, Error> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|error| Error::MultipartError(error.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let name = field.file_name().unwrap_or("attachment").to_owned();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_owned();
        let bytes = field
            .bytes()
            .await
            .map_err(|error| Error::MultipartError(error.to_string()))?;

        return Ok(UploadedFile {
            name,
            content_type,
            bytes: bytes.to_vec(),
        });
    }

    Err(Error::MissingUploadFile)
}
