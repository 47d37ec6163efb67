#![allow(dead_code)]

pub mod k8s_client;
pub mod reviews;
pub mod test_app;
