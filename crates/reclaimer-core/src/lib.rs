//! reclaimer-core
//!
//! Background reclamation of task working directories and retention-aware
//! retirement of backups.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, request, backup_type, verdict, state, errors）
//! - **ports**: 抽象化レイヤー（FilesystemExecutor, Clock, IdGenerator, StateStore）
//! - **queue**: 重複なしの pending 集合（snapshot-drain）
//! - **app**: アプリケーションロジック（builder, reclaimer, retention, task_cleanup, sweep_loop）
//! - **impls**: 実装（NativeExecutor, CommandExecutor, JsonStateCodec, FileStateStore）
//! - **config**: TOML 設定

pub mod app;
pub mod config;
pub mod domain;
pub mod impls;
pub mod ports;
pub mod queue;
