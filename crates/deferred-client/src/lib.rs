pub mod camera;
pub mod cli;
pub mod composite;
pub mod config;
pub mod engine;
pub mod error;
pub mod gbuffer;
pub mod gpu;
pub mod input;
pub mod layouts;
pub mod lights;
pub mod mesh;
pub mod pipelines;
pub mod renderer;
pub mod shader;
