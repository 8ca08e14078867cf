use axum::{
    Router,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
};
use tower::ServiceBuilder;

use crate::{
    AppState,
    middleware::{admin_middleware, auth_middleware, log_requests},
    routes::{health, user},
};

/// 组装全部路由：用户接口挂在 `{api_base_uri}/users` 下，健康检查在根路径
pub fn create_router(state: AppState) -> Router {
    // 公开路由
    let public_routes = Router::new()
        .route("/register", post(user::register))
        .route("/login", post(user::login));

    // 仅管理员
    let admin_routes = Router::new()
        .route("/", get(user::list_users))
        .route("/search", get(user::search_users))
        .route(
            "/{id}",
            get(user::get_user)
                .put(user::update_user)
                .delete(user::delete_user),
        )
        .route_layer(from_fn(admin_middleware));

    // 需要认证的路由；route_layer 保证 auth 先于 admin 执行
    let protected_routes = Router::new()
        .route("/profile", get(user::get_profile).put(user::update_profile))
        .merge(admin_routes)
        .route_layer(from_fn_with_state(state.clone(), auth_middleware));

    let users = Router::new().merge(public_routes).merge(protected_routes);

    let router = Router::new()
        .nest(&format!("{}/users", state.config.api_base_uri), users)
        .route("/health", get(health::health_check))
        .layer(ServiceBuilder::new().layer(from_fn(log_requests)));

    // 开发模式下允许所有来源
    #[cfg(debug_assertions)]
    let router = router.layer(tower_http::cors::CorsLayer::permissive());

    router.with_state(state)
}
