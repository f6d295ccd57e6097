//! Console-backed gateway used when no device is attached

use async_trait::async_trait;
use tracing::info;

use super::{ActionGateway, GatewayError, MoveDirection};

/// Logs every action instead of driving hardware. Stands in for the device
/// link during development and demos.
#[derive(Debug, Default, Clone)]
pub struct ConsoleGateway;

impl ConsoleGateway {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ActionGateway for ConsoleGateway {
    async fn move_steps(&self, steps: u32, direction: MoveDirection) -> Result<(), GatewayError> {
        info!(steps, direction = %direction, "walk");
        Ok(())
    }

    async fn speak(&self, text: &str) -> Result<(), GatewayError> {
        println!("[voice] {}", text);
        Ok(())
    }

    async fn play_named(&self, name: &str) -> Result<(), GatewayError> {
        info!(name, "play animation");
        Ok(())
    }
}
