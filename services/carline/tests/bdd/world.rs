//! BDD test world for carline service

use std::collections::HashMap;

use cucumber::World;
use carline::board::Board;
use carline::model::Dismissal;

// 2026-10-19T12:00Z
pub const NOON: u64 = 1_792_368_000_000 + 12 * 3_600_000;

#[derive(Debug, World)]
pub struct CarlineWorld {
    pub board: Option<Board>,
    pub now_ms: u64,
    pub auto_clear_delay_seconds: u64,
    /// Car number to dismissal id
    pub cars: HashMap<u32, String>,
    pub last_result: Option<carline::Result<Dismissal>>,
    pub cleared: usize,
}

impl Default for CarlineWorld {
    fn default() -> Self {
        Self {
            board: None,
            now_ms: NOON,
            auto_clear_delay_seconds: 300,
            cars: HashMap::new(),
            last_result: None,
            cleared: 0,
        }
    }
}

impl CarlineWorld {
    pub fn board(&self) -> &Board {
        self.board.as_ref().expect("no school set up")
    }

    pub fn car_id(&self, car: u32) -> String {
        self.cars
            .get(&car)
            .unwrap_or_else(|| panic!("car {} never joined the line", car))
            .clone()
    }
}
