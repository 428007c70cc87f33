use crate::error::Result;
use crate::models::user::User;
use sqlx::{PgPool, QueryBuilder};

const USER_COLUMNS: &str = "id, name, email, role, avatar_url, created_at";

#[derive(Clone)]
pub struct UserService {
    pool: PgPool,
}

impl UserService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_user(&self, id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    /// Keyword search over name and email. An empty keyword matches everyone;
    /// the exclusion set applies either way.
    pub async fn search(&self, keyword: &str, exclude: &[i64]) -> Result<Vec<User>> {
        let mut qb: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(format!(
            "SELECT {} FROM users WHERE TRUE",
            USER_COLUMNS
        ));

        if !keyword.is_empty() {
            let pattern = format!("%{}%", keyword);
            qb.push(" AND (name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR email ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        if !exclude.is_empty() {
            qb.push(" AND id != ALL(")
                .push_bind(exclude.to_vec())
                .push(")");
        }
        qb.push(" ORDER BY name ASC LIMIT 20");

        let users = qb.build_query_as::<User>().fetch_all(&self.pool).await?;
        Ok(users)
    }
}
