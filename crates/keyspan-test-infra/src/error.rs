use thiserror::Error;

pub type Result<T> = std::result::Result<T, TestInfraError>;

#[derive(Debug, Error)]
pub enum TestInfraError {
    #[error("container failed: {0}")]
    Container(#[from] testcontainers::TestcontainersError),

    #[error("redis fixture failed: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("mysql fixture failed: {0}")]
    MySql(#[from] sqlx::Error),
}
