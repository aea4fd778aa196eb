//! Contact relay — anti-spam gate and mail dispatch for website forms.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod mail;
pub mod routing;
pub mod spam;
