//! PostgreSQL fixtures for store and handler tests
//!
//! # Examples
//!
//! ```rust,ignore
//! #[sqlx::test(migrations = "../../migrations")]
//! async fn test_something(pool: PgPool) -> sqlx::Result<()> {
//!     let course = TestCourse::new("Rust Basics")
//!         .with_chapter("Intro", &["Hello", "Cargo"])
//!         .insert(&pool)
//!         .await?;
//!
//!     let first = course.lesson(0, 0);
//!     Ok(())
//! }
//! ```

use sqlx::PgPool;
use uuid::Uuid;

/// Builder for a course with chapters and lessons
#[derive(Debug, Clone)]
pub struct TestCourse {
    pub id: Uuid,
    pub title: String,
    pub is_published: bool,
    chapters: Vec<(String, Vec<String>)>,
}

/// Ids of an inserted [`TestCourse`], chapters and lessons in position order
#[derive(Debug, Clone)]
pub struct InsertedCourse {
    pub course_id: Uuid,
    pub chapters: Vec<(Uuid, Vec<Uuid>)>,
}

impl InsertedCourse {
    pub fn chapter(&self, chapter: usize) -> Uuid {
        self.chapters[chapter].0
    }

    pub fn lesson(&self, chapter: usize, index: usize) -> Uuid {
        self.chapters[chapter].1[index]
    }
}

impl TestCourse {
    pub fn new(title: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.to_string(),
            is_published: true,
            chapters: Vec::new(),
        }
    }

    pub fn with_chapter(mut self, title: &str, lessons: &[&str]) -> Self {
        self.chapters
            .push((title.to_string(), lessons.iter().map(|l| l.to_string()).collect()));
        self
    }

    pub async fn insert(self, pool: &PgPool) -> sqlx::Result<InsertedCourse> {
        sqlx::query("INSERT INTO courses (id, title, is_published) VALUES ($1, $2, $3)")
            .bind(self.id)
            .bind(&self.title)
            .bind(self.is_published)
            .execute(pool)
            .await?;

        let mut chapters = Vec::new();
        for (chapter_position, (title, lessons)) in self.chapters.iter().enumerate() {
            let chapter_id = Uuid::new_v4();
            sqlx::query(
                "INSERT INTO chapters (id, course_id, title, position) VALUES ($1, $2, $3, $4)",
            )
            .bind(chapter_id)
            .bind(self.id)
            .bind(title)
            .bind(chapter_position as i32)
            .execute(pool)
            .await?;

            let mut lesson_ids = Vec::new();
            for (position, lesson_title) in lessons.iter().enumerate() {
                let lesson_id = insert_lesson(pool, lesson_title).await?;
                let version_id = insert_version(pool, lesson_id).await?;

                sqlx::query(
                    r#"
                    INSERT INTO lesson_placements
                        (lesson_id, chapter_id, course_id, position, lesson_version_id)
                    VALUES ($1, $2, $3, $4, $5)
                    "#,
                )
                .bind(lesson_id)
                .bind(chapter_id)
                .bind(self.id)
                .bind(position as i32)
                .bind(version_id)
                .execute(pool)
                .await?;

                lesson_ids.push(lesson_id);
            }

            chapters.push((chapter_id, lesson_ids));
        }

        Ok(InsertedCourse {
            course_id: self.id,
            chapters,
        })
    }
}

/// Insert a lesson without any version
pub async fn insert_lesson(pool: &PgPool, title: &str) -> sqlx::Result<Uuid> {
    sqlx::query_scalar("INSERT INTO lessons (title) VALUES ($1) RETURNING id")
        .bind(title)
        .fetch_one(pool)
        .await
}

/// Insert a version and make it the lesson's active one
pub async fn insert_version(pool: &PgPool, lesson_id: Uuid) -> sqlx::Result<Uuid> {
    let version_id: Uuid =
        sqlx::query_scalar("INSERT INTO lesson_versions (lesson_id) VALUES ($1) RETURNING id")
            .bind(lesson_id)
            .fetch_one(pool)
            .await?;

    sqlx::query("UPDATE lessons SET active_version_id = $1 WHERE id = $2")
        .bind(version_id)
        .bind(lesson_id)
        .execute(pool)
        .await?;

    Ok(version_id)
}
