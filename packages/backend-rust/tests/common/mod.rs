use wordmaster_backend_rust::create_app;

pub async fn create_test_app() -> axum::Router {
    std::env::set_var("APP_ENV", "test");
    create_app().await
}
