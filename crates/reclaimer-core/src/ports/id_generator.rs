//! IdGenerator port - ID 生成の抽象化
//!
//! # 実装
//! - **UlidGenerator**: Clock の時刻 + ランダム部で ULID を生成

use crate::domain::SweepId;
use crate::ports::Clock;
use ulid::Ulid;

pub trait IdGenerator: Send + Sync {
    fn generate_sweep_id(&self) -> SweepId;
}

/// UlidGenerator は ULID ベースの ID 生成器
///
/// FixedClock を渡すと timestamp 部分が決定的になります。
pub struct UlidGenerator<C> {
    clock: C,
}

impl<C: Clock> UlidGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }
}

impl<C: Clock> IdGenerator for UlidGenerator<C> {
    fn generate_sweep_id(&self) -> SweepId {
        let timestamp_ms = self.clock.now().timestamp_millis().max(0) as u64;
        SweepId::from(Ulid::from_parts(timestamp_ms, rand::random()))
    }
}
