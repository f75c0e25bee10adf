//! SQLite-backed index at a single fixed location.
//!
//! Every rebuild deletes the previous database, so the file only ever holds
//! the chunks of the most recently indexed transcript. Similarity is computed
//! in Rust over all stored embeddings.

use super::{rank_documents, Document, SearchResult, VectorIndex};
use crate::error::{Result, VidqaError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info, instrument};

const SCHEMA: &str = r#"
    CREATE TABLE documents (
        chunk_order INTEGER PRIMARY KEY,
        content TEXT NOT NULL,
        embedding BLOB NOT NULL
    );

    CREATE TABLE index_meta (
        video_id TEXT NOT NULL,
        fingerprint TEXT NOT NULL,
        chunk_count INTEGER NOT NULL,
        built_at TEXT NOT NULL
    );
"#;

/// What the slot currently holds.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexMeta {
    pub video_id: String,
    pub fingerprint: String,
    pub chunk_count: usize,
    pub built_at: DateTime<Utc>,
}

/// Index persisted in one SQLite file.
pub struct SqliteIndex {
    conn: Mutex<Connection>,
}

impl SqliteIndex {
    /// Delete the database at `path` and its journal files, if present.
    pub fn clear(path: &Path) -> Result<()> {
        remove_database(path)
    }

    /// Destroy whatever is stored at `path` and write a fresh index.
    #[instrument(skip(docs, fingerprint), fields(docs = docs.len()))]
    pub fn rebuild(
        path: &Path,
        video_id: &str,
        fingerprint: &str,
        docs: &[Document],
    ) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        remove_database(path)?;

        let mut conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO documents (chunk_order, content, embedding) VALUES (?1, ?2, ?3)",
            )?;
            for doc in docs {
                stmt.execute(params![
                    doc.chunk_order as i64,
                    doc.content,
                    embedding_to_bytes(&doc.embedding),
                ])?;
            }
        }
        tx.execute(
            "INSERT INTO index_meta (video_id, fingerprint, chunk_count, built_at) VALUES (?1, ?2, ?3, ?4)",
            params![video_id, fingerprint, docs.len() as i64, Utc::now().to_rfc3339()],
        )?;
        tx.commit()?;

        info!("Rebuilt index at {:?} with {} chunks for {}", path, docs.len(), video_id);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// The metadata row written by the last rebuild.
    pub fn meta(&self) -> Result<IndexMeta> {
        let conn = self.conn.lock().map_err(|e| {
            VidqaError::VectorStore(format!("Failed to acquire lock: {}", e))
        })?;

        let (video_id, fingerprint, chunk_count, built_at): (String, String, i64, String) = conn
            .query_row(
                "SELECT video_id, fingerprint, chunk_count, built_at FROM index_meta",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )?;

        Ok(IndexMeta {
            video_id,
            fingerprint,
            chunk_count: chunk_count as usize,
            built_at: DateTime::parse_from_rfc3339(&built_at)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| VidqaError::VectorStore(format!("Invalid built_at: {}", e)))?,
        })
    }

    fn load_documents(&self) -> Result<Vec<Document>> {
        let conn = self.conn.lock().map_err(|e| {
            VidqaError::VectorStore(format!("Failed to acquire lock: {}", e))
        })?;

        let mut stmt = conn.prepare(
            "SELECT chunk_order, content, embedding FROM documents ORDER BY chunk_order",
        )?;

        let docs = stmt.query_map([], |row| {
            let chunk_order: i64 = row.get(0)?;
            let embedding_bytes: Vec<u8> = row.get(2)?;
            Ok(Document {
                chunk_order: chunk_order as usize,
                content: row.get(1)?,
                embedding: bytes_to_embedding(&embedding_bytes),
            })
        })?;

        let result = docs.collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(result)
    }
}

#[async_trait]
impl VectorIndex for SqliteIndex {
    #[instrument(skip(self, query_embedding))]
    async fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<SearchResult>> {
        let results = rank_documents(self.load_documents()?, query_embedding, limit);
        debug!("Found {} matching documents", results.len());
        Ok(results)
    }

    async fn document_count(&self) -> Result<usize> {
        let conn = self.conn.lock().map_err(|e| {
            VidqaError::VectorStore(format!("Failed to acquire lock: {}", e))
        })?;

        let count: i64 = conn.query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

/// Remove a database file and the journal files SQLite keeps next to it.
fn remove_database(path: &Path) -> Result<()> {
    let mut targets = vec![path.to_path_buf()];
    for suffix in ["-journal", "-wal", "-shm"] {
        let mut sibling = path.as_os_str().to_os_string();
        sibling.push(suffix);
        targets.push(PathBuf::from(sibling));
    }

    for target in targets {
        match std::fs::remove_file(&target) {
            Ok(()) => debug!("Removed {:?}", target),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

/// Serialize embedding to little-endian bytes.
fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
}

fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| {
            let arr: [u8; 4] = chunk.try_into().unwrap_or_default();
            f32::from_le_bytes(arr)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::Chunk;
    use tempfile::TempDir;

    fn docs(texts: &[&str]) -> Vec<Document> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| {
                let mut embedding = vec![0.0; texts.len()];
                embedding[i] = 1.0;
                Document::new(Chunk::new(*t, i), embedding)
            })
            .collect()
    }

    #[tokio::test]
    async fn test_rebuild_and_search() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("index.db");

        let index = SqliteIndex::rebuild(&path, "video1", "fp1", &docs(&["a", "b", "c"])).unwrap();

        assert_eq!(index.document_count().await.unwrap(), 3);
        let results = index.search(&[0.0, 1.0, 0.0], 2).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].document.content, "b");
        assert!((results[0].score - 1.0).abs() < 0.001);
        assert_eq!(results[0].document.embedding, vec![0.0, 1.0, 0.0]);

        let meta = index.meta().unwrap();
        assert_eq!(meta.video_id, "video1");
        assert_eq!(meta.fingerprint, "fp1");
        assert_eq!(meta.chunk_count, 3);
    }

    #[tokio::test]
    async fn test_rebuild_replaces_previous_video() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("index.db");

        let first = SqliteIndex::rebuild(&path, "video_a", "fa", &docs(&["a1", "a2", "a3"])).unwrap();
        drop(first);

        let second = SqliteIndex::rebuild(&path, "video_b", "fb", &docs(&["b1", "b2"])).unwrap();

        assert_eq!(second.document_count().await.unwrap(), 2);
        assert_eq!(second.meta().unwrap().video_id, "video_b");
        let results = second.search(&[1.0, 1.0], 10).await.unwrap();
        assert!(results.iter().all(|r| r.document.content.starts_with('b')));
    }

    #[tokio::test]
    async fn test_rebuild_clears_stale_sibling_files() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("index.db");
        std::fs::write(&path, b"not a database").unwrap();
        std::fs::write(dir.path().join("index.db-journal"), b"stale").unwrap();

        let index = SqliteIndex::rebuild(&path, "video1", "fp", &docs(&["only"])).unwrap();

        assert_eq!(index.document_count().await.unwrap(), 1);
        assert!(!dir.path().join("index.db-journal").exists());
    }

    #[test]
    fn test_clear_removes_database_and_siblings() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("index.db");
        let index = SqliteIndex::rebuild(&path, "video1", "fp", &docs(&["a", "b"])).unwrap();
        drop(index);
        std::fs::write(dir.path().join("index.db-shm"), b"stale").unwrap();

        SqliteIndex::clear(&path).unwrap();

        assert!(!path.exists());
        assert!(!dir.path().join("index.db-wal").exists());
        assert!(!dir.path().join("index.db-shm").exists());
        // Clearing an empty slot is fine
        SqliteIndex::clear(&path).unwrap();
    }

    #[tokio::test]
    async fn test_empty_rebuild() {
        let dir = TempDir::new().unwrap();
        let index = SqliteIndex::rebuild(&dir.path().join("index.db"), "v", "fp", &[]).unwrap();

        assert_eq!(index.document_count().await.unwrap(), 0);
        assert!(index.search(&[1.0], 3).await.unwrap().is_empty());
        assert_eq!(index.meta().unwrap().chunk_count, 0);
    }

    #[test]
    fn test_embedding_bytes() {
        let embedding = vec![0.5, -1.25, 3.0];
        let bytes = embedding_to_bytes(&embedding);
        assert_eq!(bytes.len(), 12);
        assert_eq!(bytes_to_embedding(&bytes), embedding);
    }
}
