use crate::dto::application_dto::{ApplicationFilter, ApplicationForm};
use crate::error::{Error, Result};
use crate::models::application::{
    Application, ApplicationSummary, Qualification, StoredValue,
};
use crate::models::field::{validate_values, FieldSpec, FieldValue};
use crate::models::pipeline::event_type;
use crate::models::stage::{Stage, DISQUALIFIED_STAGE};
use crate::services::mail_service::{MailArgs, MailService};
use crate::services::pipeline_service::PipelineService;
use crate::services::settings_service::SettingsService;
use crate::utils::paging;
use sqlx::{PgPool, QueryBuilder};
use std::path::Path;
use tokio::fs;

const APPLICATION_COLUMNS: &str = "id, job_id, first_name, last_name, email, phone, cover_letter, \
                                   stage_id, is_complete, created_at";

const ALLOWED_UPLOAD_EXTS: &[&str] = &["pdf", "doc", "docx", "txt", "rtf", "jpg", "jpeg", "png"];

#[derive(Clone)]
pub struct ApplicationService {
    pool: PgPool,
}

impl ApplicationService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert the application in an incomplete state together with its typed
    /// field values. Values are validated against the job's declared schema
    /// before anything is written.
    pub async fn create_application(
        &self,
        form: &ApplicationForm,
        schema: &[FieldSpec],
    ) -> Result<i64> {
        let values = validate_values(schema, &form.fields).map_err(Error::BadRequest)?;

        let mut tx = self.pool.begin().await?;

        let (application_id,): (i64,) = sqlx::query_as(
            "INSERT INTO applications (job_id, first_name, last_name, email, phone, cover_letter)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING id",
        )
        .bind(form.job_id)
        .bind(&form.first_name)
        .bind(&form.last_name)
        .bind(&form.email)
        .bind(&form.phone)
        .bind(&form.cover_letter)
        .fetch_one(&mut *tx)
        .await?;

        for (key, value) in &values {
            sqlx::query(
                "INSERT INTO application_values (application_id, field_key, field_value)
                 VALUES ($1, $2, $3)",
            )
            .bind(application_id)
            .bind(key)
            .bind(serde_json::to_value(value)?)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(application_id)
    }

    /// Single-field read backing the upload precondition check.
    pub async fn is_complete(&self, application_id: i64) -> Result<Option<bool>> {
        let row: Option<(bool,)> =
            sqlx::query_as("SELECT is_complete FROM applications WHERE id = $1")
                .bind(application_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(complete,)| complete))
    }

    /// The single point marking an application complete. Idempotent: the
    /// conditional UPDATE makes a second call a no-op, so the pipeline entry
    /// and the recruiter notification fire at most once.
    pub async fn finalize_application(
        &self,
        application_id: i64,
        pipeline: &PipelineService,
        mail: &MailService,
        settings: &SettingsService,
    ) -> Result<bool> {
        let finalized = sqlx::query(
            "UPDATE applications SET is_complete = TRUE
             WHERE id = $1 AND is_complete = FALSE",
        )
        .bind(application_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if finalized == 0 {
            return Ok(false);
        }

        pipeline
            .append(application_id, event_type::APPLIED, None, None, None)
            .await?;

        let recruiter_email = settings.recruiter_email().await?;
        if let Some(to) = recruiter_email.clone() {
            let row: Option<(String, String, String)> = sqlx::query_as(
                "SELECT a.first_name, a.last_name, j.title
                 FROM applications a JOIN jobs j ON j.id = a.job_id
                 WHERE a.id = $1",
            )
            .bind(application_id)
            .fetch_optional(&self.pool)
            .await?;

            if let Some((first_name, last_name, job_title)) = row {
                let sent = mail
                    .send(
                        MailArgs {
                            subject: format!("New application: {}", job_title),
                            body: format!(
                                "{} {} applied for {}.",
                                first_name, last_name, job_title
                            ),
                            to,
                            ..Default::default()
                        },
                        recruiter_email.as_deref(),
                    )
                    .await;
                if !sent {
                    tracing::warn!(application_id, "recruiter notification not delivered");
                }
            }
        }

        Ok(true)
    }

    /// Store an uploaded file and record it as an attachment field value.
    /// Callers must have verified the application exists and is incomplete.
    pub async fn upload_application_file(
        &self,
        application_id: i64,
        field_name: &str,
        file_name: &str,
        data: &[u8],
        uploads_dir: &str,
    ) -> Result<String> {
        let ext = validate_upload(file_name, data)?;

        let dir = format!("{}/applications/{}", uploads_dir, application_id);
        fs::create_dir_all(&dir).await?;
        let stored_name = format!("{}.{}", uuid::Uuid::new_v4(), ext);
        let path = format!("{}/{}", dir, stored_name);
        fs::write(&path, data).await?;

        let value = FieldValue::Attachment {
            file_name: file_name.to_string(),
            url: path.clone(),
        };
        sqlx::query(
            "INSERT INTO application_values (application_id, field_key, field_value)
             VALUES ($1, $2, $3)
             ON CONFLICT (application_id, field_key)
             DO UPDATE SET field_value = EXCLUDED.field_value",
        )
        .bind(application_id)
        .bind(field_name)
        .bind(serde_json::to_value(&value)?)
        .execute(&self.pool)
        .await?;

        Ok(path)
    }

    /// One page of completed applications matching the filter.
    pub async fn get_applications(
        &self,
        filter: &ApplicationFilter,
    ) -> Result<Vec<ApplicationSummary>> {
        let mut qb: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(
            "SELECT a.id, a.job_id, a.first_name, a.last_name, a.email, a.stage_id,
                    s.name AS stage_name, a.created_at
             FROM applications a
             LEFT JOIN stages s ON s.id = a.stage_id
             WHERE a.is_complete = TRUE",
        );
        push_filter(&mut qb, filter, filter.qualification.unwrap_or_default());

        let (limit, offset) = paging::limit_offset(filter.page, filter.per_page, 20);
        qb.push(" ORDER BY a.created_at DESC, a.id DESC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let applications = qb
            .build_query_as::<ApplicationSummary>()
            .fetch_all(&self.pool)
            .await?;
        Ok(applications)
    }

    /// Count-only variant over the unpaginated filter, for the given
    /// qualification axis. Qualified and disqualified partition the base set,
    /// so the two counts always sum to the total.
    pub async fn count_applications(
        &self,
        filter: &ApplicationFilter,
        qualification: Qualification,
    ) -> Result<i64> {
        let mut qb: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(
            "SELECT COUNT(*)
             FROM applications a
             LEFT JOIN stages s ON s.id = a.stage_id
             WHERE a.is_complete = TRUE",
        );
        push_filter(&mut qb, filter, qualification);

        let (count,): (i64,) = qb.build_query_as().fetch_one(&self.pool).await?;
        Ok(count)
    }

    pub async fn get_single_application(
        &self,
        job_id: i64,
        application_id: i64,
    ) -> Result<Option<(Application, Option<String>, Vec<StoredValue>)>> {
        let row: Option<Application> = sqlx::query_as(&format!(
            "SELECT {} FROM applications WHERE id = $1 AND job_id = $2",
            APPLICATION_COLUMNS
        ))
        .bind(application_id)
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(application) = row else {
            return Ok(None);
        };

        let stage_name = match application.stage_id {
            Some(stage_id) => {
                let name: Option<(String,)> =
                    sqlx::query_as("SELECT name FROM stages WHERE id = $1")
                        .bind(stage_id)
                        .fetch_optional(&self.pool)
                        .await?;
                name.map(|(n,)| n)
            }
            None => None,
        };

        let values = sqlx::query_as::<_, StoredValue>(
            "SELECT field_key, field_value FROM application_values
             WHERE application_id = $1 ORDER BY field_key",
        )
        .bind(application_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some((application, stage_name, values)))
    }

    /// Move the application to a stage of its job and append the matching
    /// pipeline entry. Moving to the current stage still appends: the log is
    /// a record of recruiter actions, not of distinct states.
    pub async fn change_stage(
        &self,
        application_id: i64,
        stage: &Stage,
        actor_id: Option<i64>,
        pipeline: &PipelineService,
    ) -> Result<()> {
        let updated = sqlx::query(
            "UPDATE applications SET stage_id = $1 WHERE id = $2 AND job_id = $3",
        )
        .bind(stage.id)
        .bind(application_id)
        .bind(stage.job_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if updated == 0 {
            return Err(Error::NotFound("Application not found".to_string()));
        }

        let event = if stage.name == DISQUALIFIED_STAGE {
            event_type::DISQUALIFIED
        } else {
            event_type::STAGE_CHANGE
        };
        pipeline
            .append(
                application_id,
                event,
                Some(stage.id),
                actor_id,
                Some(serde_json::json!({ "stage_name": stage.name })),
            )
            .await?;

        Ok(())
    }

    /// Hard delete. Pipeline entries and field values go with the row via FK
    /// cascade; the uploads directory is removed from disk afterwards.
    pub async fn delete_application(&self, application_id: i64, uploads_dir: &str) -> Result<()> {
        let deleted = sqlx::query("DELETE FROM applications WHERE id = $1")
            .bind(application_id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if deleted == 0 {
            return Err(Error::NotFound("Application not found".to_string()));
        }

        let dir = format!("{}/applications/{}", uploads_dir, application_id);
        if Path::new(&dir).exists() {
            if let Err(err) = fs::remove_dir_all(&dir).await {
                tracing::warn!(application_id, error = ?err, "failed to remove uploads directory");
            }
        }

        Ok(())
    }
}

fn push_filter(
    qb: &mut QueryBuilder<sqlx::Postgres>,
    filter: &ApplicationFilter,
    qualification: Qualification,
) {
    if let Some(job_id) = filter.job_id {
        qb.push(" AND a.job_id = ").push_bind(job_id);
    }
    match qualification {
        Qualification::Qualified => {
            qb.push(" AND COALESCE(s.name, '') <> ")
                .push_bind(DISQUALIFIED_STAGE);
        }
        Qualification::Disqualified => {
            qb.push(" AND COALESCE(s.name, '') = ")
                .push_bind(DISQUALIFIED_STAGE);
        }
    }
}

/// Extension whitelist plus magic-byte checks; returns the normalized
/// extension for the stored file name.
fn validate_upload(file_name: &str, data: &[u8]) -> Result<String> {
    if data.is_empty() {
        return Err(Error::BadRequest("Invalid file".to_string()));
    }

    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    if !ALLOWED_UPLOAD_EXTS.contains(&ext.as_str()) {
        return Err(Error::BadRequest(format!(
            "File type .{} is not allowed",
            ext
        )));
    }

    if ext == "pdf" && !data.starts_with(b"%PDF") {
        return Err(Error::BadRequest("Invalid PDF file content".to_string()));
    }
    if (ext == "jpg" || ext == "jpeg") && !data.starts_with(&[0xFF, 0xD8]) {
        return Err(Error::BadRequest("Invalid JPEG file content".to_string()));
    }
    if ext == "png" && !data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
        return Err(Error::BadRequest("Invalid PNG file content".to_string()));
    }

    Ok(ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_rejects_empty_file() {
        assert!(validate_upload("resume.pdf", b"").is_err());
    }

    #[test]
    fn upload_rejects_unlisted_extension() {
        let err = validate_upload("payload.exe", b"MZ...").unwrap_err();
        assert!(err.to_string().contains(".exe"));
    }

    #[test]
    fn upload_checks_pdf_magic_bytes() {
        assert!(validate_upload("resume.pdf", b"not a pdf").is_err());
        assert_eq!(
            validate_upload("resume.pdf", b"%PDF-1.7 ...").unwrap(),
            "pdf"
        );
    }

    #[test]
    fn upload_normalizes_extension_case() {
        assert_eq!(validate_upload("CV.TXT", b"hello").unwrap(), "txt");
    }
}
