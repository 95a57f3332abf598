// src/main.rs

use dotenvy::dotenv;
use proctor::channel::ChannelRegistry;
use proctor::config::Config;
use proctor::routes;
use proctor::state::AppState;
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use std::net::SocketAddr;
use std::time::Duration;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenv().ok();

    // Load configuration from environment
    let config = Config::from_env();

    let file_appender = tracing_appender::rolling::daily("logs", "proctor.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    // Initialize Database Pool with Retry
    let mut retry_count = 0;
    let pool = loop {
        match SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await
        {
            Ok(pool) => break pool,
            Err(e) => {
                retry_count += 1;
                if retry_count > 5 {
                    panic!("Failed to connect to database after 5 retries: {}", e);
                }
                tracing::warn!(
                    "Database not ready, retrying in 2s... (Attempt {})",
                    retry_count
                );
                tokio::time::sleep(Duration::from_secs(2)).await;
            }
        }
    };

    tracing::info!("Database connected...");

    // Run Migrations Automatically
    tracing::info!("Running migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Migrations applied successfully.");

    // Seed a demo quiz on first start
    if let Err(e) = seed_demo_quiz(&pool).await {
        tracing::error!("Failed to seed demo quiz: {:?}", e);
    }

    // Create AppState
    let state = AppState {
        pool: pool.clone(),
        config: config.clone(),
        channel: ChannelRegistry::new(),
    };

    // Create the Axum application router
    let app = routes::create_router(state);

    // Bind to the listening address
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Listening on {}", addr);
    tracing::info!("Admin login configured for user: {}", config.admin_username);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();

    // Start the server
    axum::serve(listener, app).await.unwrap();
}

/// Seeds one active question set when the quizzes table is empty, so a
/// fresh deployment has something to proctor.
async fn seed_demo_quiz(pool: &SqlitePool) -> Result<(), Box<dyn std::error::Error>> {
    let quiz_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM quizzes")
        .fetch_one(pool)
        .await?;

    if quiz_count > 0 {
        return Ok(());
    }

    tracing::info!("Seeding demo quiz...");

    let questions = serde_json::json!([
        {
            "id": 1,
            "question": "Which algorithm minimizes a loss function by iteratively following its negative gradient?",
            "options": ["Gradient Descent", "K-Means", "Apriori", "PageRank"],
            "correct_answer": "Gradient Descent",
            "explanation": "Gradient descent updates parameters against the gradient of the loss."
        },
        {
            "id": 2,
            "question": "What does overfitting describe?",
            "options": [
                "A model that performs well on training data but poorly on unseen data",
                "A model that underperforms everywhere",
                "A dataset with too few features",
                "A regularized model"
            ],
            "correct_answer": "A model that performs well on training data but poorly on unseen data",
            "explanation": null
        },
        {
            "id": 3,
            "question": "Which of these is a supervised learning task?",
            "options": ["Clustering", "Classification", "Dimensionality reduction", "Anomaly detection"],
            "correct_answer": "Classification",
            "explanation": null
        },
        {
            "id": 4,
            "question": "What does the learning rate control in gradient-based training?",
            "options": ["Step size of parameter updates", "Number of layers", "Batch ordering", "Weight initialization"],
            "correct_answer": "Step size of parameter updates",
            "explanation": null
        },
        {
            "id": 5,
            "question": "Which metric is most appropriate for a heavily imbalanced binary classifier?",
            "options": ["Accuracy", "F1 score", "Mean squared error", "R squared"],
            "correct_answer": "F1 score",
            "explanation": "Accuracy is misleading when one class dominates."
        }
    ]);

    sqlx::query(
        "INSERT INTO quizzes (title, questions, duration_per_question, is_active) VALUES (?, ?, ?, 1)",
    )
    .bind("ML Technical Quiz")
    .bind(questions.to_string())
    .bind(45_i64)
    .execute(pool)
    .await?;

    tracing::info!("Demo quiz seeded");
    Ok(())
}
