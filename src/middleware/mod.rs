/*
 * Responsibility
 * - Middleware entry points (`auth::access::require`, `http::apply`)
 */
pub mod auth;
pub mod http;
