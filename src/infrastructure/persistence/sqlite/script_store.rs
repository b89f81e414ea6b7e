//! SQLite Script Store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

use super::DbPool;
use crate::application::ports::{RepositoryError, ScriptStorePort};
use crate::domain::script::{NovelId, SceneScript, ScriptDocument};

/// SQLite Script Store
pub struct SqliteScriptStore {
    pool: DbPool,
}

impl SqliteScriptStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct ScriptDocumentRow {
    chapter_number: i64,
    chapter_title: String,
    scenes: String,
    generated_at: String,
}

impl TryFrom<ScriptDocumentRow> for ScriptDocument {
    type Error = RepositoryError;

    fn try_from(row: ScriptDocumentRow) -> Result<Self, Self::Error> {
        let scenes: Vec<SceneScript> = serde_json::from_str(&row.scenes)
            .map_err(|e| RepositoryError::SerializationError(e.to_string()))?;
        let chapter_number = u32::try_from(row.chapter_number)
            .map_err(|e| RepositoryError::SerializationError(e.to_string()))?;
        let generated_at = DateTime::parse_from_rfc3339(&row.generated_at)
            .map_err(|e| RepositoryError::SerializationError(e.to_string()))?
            .with_timezone(&Utc);

        Ok(ScriptDocument::assemble(
            chapter_number,
            row.chapter_title,
            scenes,
            generated_at,
        ))
    }
}

#[async_trait]
impl ScriptStorePort for SqliteScriptStore {
    async fn load_existing_scripts(
        &self,
        novel_id: &NovelId,
    ) -> Result<Vec<ScriptDocument>, RepositoryError> {
        let rows: Vec<ScriptDocumentRow> = sqlx::query_as(
            "SELECT chapter_number, chapter_title, scenes, generated_at FROM script_documents WHERE novel_id = ? ORDER BY chapter_number",
        )
        .bind(novel_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        rows.into_iter().map(ScriptDocument::try_from).collect()
    }

    async fn save_scripts(
        &self,
        novel_id: &NovelId,
        documents: &[ScriptDocument],
    ) -> Result<(), RepositoryError> {
        // 整体替换，保证集合原子更新
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        sqlx::query("DELETE FROM script_documents WHERE novel_id = ?")
            .bind(novel_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        for document in documents {
            let scenes = serde_json::to_string(&document.scenes)
                .map_err(|e| RepositoryError::SerializationError(e.to_string()))?;

            sqlx::query(
                r#"
                INSERT INTO script_documents (novel_id, chapter_number, chapter_title, scenes, generated_at)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(novel_id.to_string())
            .bind(document.chapter_number as i64)
            .bind(&document.chapter_title)
            .bind(scenes)
            .bind(document.generated_at.to_rfc3339())
            .execute(&mut *tx)
            .await
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        tracing::debug!(
            novel_id = %novel_id,
            documents = documents.len(),
            "Scripts saved"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::script::ShotType;
    use crate::infrastructure::persistence::sqlite::{create_pool, run_migrations, DatabaseConfig};

    async fn store() -> SqliteScriptStore {
        let pool = create_pool(&DatabaseConfig::in_memory()).await.unwrap();
        run_migrations(&pool).await.unwrap();
        SqliteScriptStore::new(pool)
    }

    fn document(number: u32, title: &str) -> ScriptDocument {
        ScriptDocument::assemble(
            number,
            title,
            vec![
                SceneScript::success(0, "石碑", "[SCENE 1: 石碑]\nWide shot: 广场", Some(ShotType::Wide)),
                SceneScript::failed(1, "timeout"),
            ],
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn test_save_and_load_preserves_documents() {
        let store = store().await;
        let novel_id = NovelId::new();
        let docs = vec![document(2, "第二章"), document(1, "第一章")];

        store.save_scripts(&novel_id, &docs).await.unwrap();
        let loaded = store.load_existing_scripts(&novel_id).await.unwrap();

        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].chapter_number, 1);
        assert_eq!(loaded[1].scenes, docs[0].scenes);
        assert_eq!(loaded[1].full_text(), docs[0].full_text());
        assert_eq!(loaded[1].scenes[0].shot, Some(ShotType::Wide));
    }

    #[tokio::test]
    async fn test_save_replaces_whole_set() {
        let store = store().await;
        let novel_id = NovelId::new();

        store
            .save_scripts(&novel_id, &[document(1, "旧"), document(2, "旧")])
            .await
            .unwrap();
        store
            .save_scripts(&novel_id, &[document(2, "新")])
            .await
            .unwrap();

        let loaded = store.load_existing_scripts(&novel_id).await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].chapter_title, "新");
    }

    #[tokio::test]
    async fn test_novels_are_isolated() {
        let store = store().await;
        let a = NovelId::new();
        let b = NovelId::new();

        store.save_scripts(&a, &[document(1, "A")]).await.unwrap();

        assert!(store.load_existing_scripts(&b).await.unwrap().is_empty());
    }
}
