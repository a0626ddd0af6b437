use std::sync::Arc;

use crate::{
	route::submit::model::{Post, SubmissionInput},
	Database,
};

/// Shared handle to the post store, cloned into every request.
pub type Store = Arc<dyn PostStore>;

/// An error raised by a [`PostStore`].
///
/// The Display trait is only written to the log, so it can show
/// sensitive information.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("database error: {0}")]
	Database(#[from] sqlx::Error),
}

/// Writes validated submissions to durable storage.
///
/// Implementations must be safe to call from many requests at once.
#[axum::async_trait]
pub trait PostStore: Send + Sync {
	/// Inserts a single post, returning it with its generated fields.
	async fn create_post(&self, input: SubmissionInput) -> Result<Post, Error>;
}

#[axum::async_trait]
impl PostStore for Database {
	#[tracing::instrument(skip_all)]
	async fn create_post(&self, input: SubmissionInput) -> Result<Post, Error> {
		let post = sqlx::query_as::<_, Post>(
			r#"
				INSERT INTO post (id, content, email)
				VALUES (DEFAULT, $1, $2)
				RETURNING id, content, email, created_at
			"#,
		)
		.bind(input.content)
		.bind(input.email)
		.fetch_one(self)
		.await?;

		Ok(post)
	}
}
