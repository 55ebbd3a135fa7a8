use std::collections::HashMap;

use crate::{
    models::{SqlChild, SqlFolder},
    Db, FolderRepo,
};
use async_trait::async_trait;
use domain::{Child, Folder};
use sqlx::PgConnection;

/// Serialises every write that renumbers `folders.position`.
async fn lock_folder_positions(conn: &mut PgConnection) -> anyhow::Result<()> {
    sqlx::query("LOCK TABLE folders IN SHARE ROW EXCLUSIVE MODE")
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Row lock on the parent; serialises child renumbering within one folder.
async fn lock_folder(conn: &mut PgConnection, folder_id: &str) -> anyhow::Result<bool> {
    let exists: Option<String> =
        sqlx::query_scalar("SELECT id FROM folders WHERE id = $1 FOR UPDATE")
            .bind(folder_id)
            .fetch_optional(&mut *conn)
            .await?;
    Ok(exists.is_some())
}

async fn insert_folder_row(
    conn: &mut PgConnection,
    folder: &Folder,
    position: i32,
) -> anyhow::Result<()> {
    sqlx::query("INSERT INTO folders (id, position, name, note) VALUES ($1, $2, $3, $4)")
        .bind(&folder.id)
        .bind(position)
        .bind(&folder.name)
        .bind(&folder.note)
        .execute(&mut *conn)
        .await?;
    insert_children(conn, &folder.id, &folder.children).await
}

async fn insert_children(
    conn: &mut PgConnection,
    folder_id: &str,
    children: &[Child],
) -> anyhow::Result<()> {
    for (position, child) in children.iter().enumerate() {
        insert_child_row(&mut *conn, folder_id, child, position as i32).await?;
    }
    Ok(())
}

async fn insert_child_row(
    conn: &mut PgConnection,
    folder_id: &str,
    child: &Child,
    position: i32,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO folder_children (id, folder_id, position, kind, name, url, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(&child.id)
    .bind(folder_id)
    .bind(position)
    .bind(child.kind.as_str())
    .bind(&child.name)
    .bind(&child.url)
    .bind(&child.created_at)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

#[async_trait]
impl FolderRepo for Db {
    async fn list_folders(&self) -> anyhow::Result<Vec<Folder>> {
        let folders = sqlx::query_as::<_, SqlFolder>(
            "SELECT id, name, note FROM folders ORDER BY position ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        let children = sqlx::query_as::<_, SqlChild>(
            r#"
            SELECT id, folder_id, kind, name, url, created_at
            FROM folder_children
            ORDER BY folder_id, position ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut by_folder: HashMap<String, Vec<Child>> = HashMap::new();
        for child in children {
            by_folder
                .entry(child.folder_id.clone())
                .or_default()
                .push(child.into());
        }

        Ok(folders
            .into_iter()
            .map(|f| {
                let mut folder = Folder::new(f.name, f.note);
                folder.children = by_folder.remove(&f.id).unwrap_or_default();
                folder.id = f.id;
                folder
            })
            .collect())
    }

    async fn insert_folder(&self, folder: &Folder) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;
        lock_folder_positions(&mut tx).await?;

        let position: i32 =
            sqlx::query_scalar("SELECT COALESCE(MAX(position) + 1, 0) FROM folders")
                .fetch_one(&mut *tx)
                .await?;
        insert_folder_row(&mut tx, folder, position).await?;

        tx.commit().await?;
        Ok(())
    }

    async fn update_folder(&self, folder: &Folder) -> anyhow::Result<bool> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query("UPDATE folders SET name = $2, note = $3 WHERE id = $1")
            .bind(&folder.id)
            .bind(&folder.name)
            .bind(&folder.note)
            .execute(&mut *tx)
            .await?;
        if updated.rows_affected() == 0 {
            return Ok(false);
        }

        sqlx::query("DELETE FROM folder_children WHERE folder_id = $1")
            .bind(&folder.id)
            .execute(&mut *tx)
            .await?;
        insert_children(&mut tx, &folder.id, &folder.children).await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn delete_folder(&self, id: &str) -> anyhow::Result<bool> {
        let mut tx = self.pool.begin().await?;
        lock_folder_positions(&mut tx).await?;

        let position: Option<i32> =
            sqlx::query_scalar("DELETE FROM folders WHERE id = $1 RETURNING position")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some(position) = position else {
            return Ok(false);
        };

        sqlx::query("UPDATE folders SET position = position - 1 WHERE position > $1")
            .bind(position)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn move_folder(&self, from: usize, to: usize) -> anyhow::Result<bool> {
        let mut tx = self.pool.begin().await?;
        lock_folder_positions(&mut tx).await?;

        let mut ids: Vec<String> =
            sqlx::query_scalar("SELECT id FROM folders ORDER BY position ASC FOR UPDATE")
                .fetch_all(&mut *tx)
                .await?;
        if from >= ids.len() || to >= ids.len() {
            return Ok(false);
        }

        let moved = ids.remove(from);
        ids.insert(to, moved);
        for (position, id) in ids.iter().enumerate() {
            sqlx::query("UPDATE folders SET position = $2 WHERE id = $1")
                .bind(id)
                .bind(position as i32)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(true)
    }

    async fn insert_child(
        &self,
        folder_id: &str,
        child: &Child,
        at_start: bool,
    ) -> anyhow::Result<bool> {
        let mut tx = self.pool.begin().await?;
        if !lock_folder(&mut tx, folder_id).await? {
            return Ok(false);
        }

        let position: i32 = if at_start {
            sqlx::query("UPDATE folder_children SET position = position + 1 WHERE folder_id = $1")
                .bind(folder_id)
                .execute(&mut *tx)
                .await?;
            0
        } else {
            sqlx::query_scalar(
                "SELECT COALESCE(MAX(position) + 1, 0) FROM folder_children WHERE folder_id = $1",
            )
            .bind(folder_id)
            .fetch_one(&mut *tx)
            .await?
        };
        insert_child_row(&mut tx, folder_id, child, position).await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn update_child(&self, folder_id: &str, child: &Child) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE folder_children
            SET kind = $3, name = $4, url = $5, created_at = $6
            WHERE id = $1 AND folder_id = $2
            "#,
        )
        .bind(&child.id)
        .bind(folder_id)
        .bind(child.kind.as_str())
        .bind(&child.name)
        .bind(&child.url)
        .bind(&child.created_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_child(&self, folder_id: &str, id: &str) -> anyhow::Result<bool> {
        let mut tx = self.pool.begin().await?;
        if !lock_folder(&mut tx, folder_id).await? {
            return Ok(false);
        }

        let position: Option<i32> = sqlx::query_scalar(
            "DELETE FROM folder_children WHERE id = $1 AND folder_id = $2 RETURNING position",
        )
        .bind(id)
        .bind(folder_id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(position) = position else {
            return Ok(false);
        };

        sqlx::query(
            "UPDATE folder_children SET position = position - 1 WHERE folder_id = $1 AND position > $2",
        )
        .bind(folder_id)
        .bind(position)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn replace_folders(&self, folders: &[Folder]) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;
        lock_folder_positions(&mut tx).await?;

        sqlx::query("DELETE FROM folders").execute(&mut *tx).await?;
        for (position, folder) in folders.iter().enumerate() {
            insert_folder_row(&mut tx, folder, position as i32).await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::ChildInput;
    use sqlx::PgPool;

    fn child(name: &str) -> Child {
        Child::from_input(ChildInput {
            name: name.into(),
            url: Some(format!("http://x/{name}")),
            ..Default::default()
        })
        .unwrap()
    }

    async fn folder_positions(db: &Db) -> Vec<(String, i32)> {
        sqlx::query_as("SELECT name, position FROM folders ORDER BY position")
            .fetch_all(&db.pool)
            .await
            .unwrap()
    }

    async fn child_positions(db: &Db, folder_id: &str) -> Vec<(String, i32)> {
        sqlx::query_as(
            "SELECT name, position FROM folder_children WHERE folder_id = $1 ORDER BY position",
        )
        .bind(folder_id)
        .fetch_all(&db.pool)
        .await
        .unwrap()
    }

    #[sqlx::test(migrations = "../../migrations")]
    #[ignore = "needs DATABASE_URL pointing at PostgreSQL"]
    async fn folder_positions_stay_dense(pool: PgPool) {
        let db = Db { pool };
        let folders: Vec<Folder> = ["A", "B", "C"].map(|n| Folder::new(n, "")).into();
        for folder in &folders {
            db.insert_folder(folder).await.unwrap();
        }

        assert!(db.move_folder(0, 2).await.unwrap());
        assert!(!db.move_folder(0, 3).await.unwrap());
        assert_eq!(
            folder_positions(&db).await,
            [("B".to_string(), 0), ("C".to_string(), 1), ("A".to_string(), 2)]
        );

        assert!(db.delete_folder(&folders[2].id).await.unwrap());
        assert!(!db.delete_folder(&folders[2].id).await.unwrap());
        assert_eq!(
            folder_positions(&db).await,
            [("B".to_string(), 0), ("A".to_string(), 1)]
        );

        db.replace_folders(&[Folder::new("X", ""), Folder::new("Y", "")])
            .await
            .unwrap();
        let names: Vec<String> = db.list_folders().await.unwrap().into_iter().map(|f| f.name).collect();
        assert_eq!(names, ["X", "Y"]);
    }

    #[sqlx::test(migrations = "../../migrations")]
    #[ignore = "needs DATABASE_URL pointing at PostgreSQL"]
    async fn concurrent_folder_inserts_get_distinct_positions(pool: PgPool) {
        let db = Db { pool };
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let db = db.clone();
                tokio::spawn(async move { db.insert_folder(&Folder::new(format!("F{i}"), "")).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let positions: Vec<i32> = folder_positions(&db).await.into_iter().map(|(_, p)| p).collect();
        assert_eq!(positions, (0..8).collect::<Vec<i32>>());
    }

    #[sqlx::test(migrations = "../../migrations")]
    #[ignore = "needs DATABASE_URL pointing at PostgreSQL"]
    async fn child_positions_stay_dense(pool: PgPool) {
        let db = Db { pool };
        let folder = Folder::new("Downloads", "");
        let other = Folder::new("Other", "");
        db.insert_folder(&folder).await.unwrap();
        db.insert_folder(&other).await.unwrap();

        let a = child("a.txt");
        let b = child("b.txt");
        let c = child("c.txt");
        assert!(db.insert_child(&folder.id, &a, false).await.unwrap());
        assert!(db.insert_child(&folder.id, &b, false).await.unwrap());
        assert!(db.insert_child(&folder.id, &c, true).await.unwrap());
        assert!(!db.insert_child("missing", &child("d.txt"), false).await.unwrap());
        assert_eq!(
            child_positions(&db, &folder.id).await,
            [("c.txt".to_string(), 0), ("a.txt".to_string(), 1), ("b.txt".to_string(), 2)]
        );

        assert!(db.delete_child(&folder.id, &a.id).await.unwrap());
        assert_eq!(
            child_positions(&db, &folder.id).await,
            [("c.txt".to_string(), 0), ("b.txt".to_string(), 1)]
        );

        let mut renamed = b.clone();
        renamed.name = "renamed.txt".into();
        assert!(!db.update_child(&other.id, &renamed).await.unwrap());
        assert!(!db.delete_child(&other.id, &b.id).await.unwrap());
        assert!(db.update_child(&folder.id, &renamed).await.unwrap());
        assert_eq!(db.list_folders().await.unwrap()[0].children[1].name, "renamed.txt");
    }
}
