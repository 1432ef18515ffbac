//! Infrastructure 層
//!
//! ドメイン層が定義するポートの具体的な実装（インメモリ Repository、
//! WebSocket ConnectionRegistry）と、ワイヤ境界の DTO を提供します。

pub mod dto;
pub mod registry;
pub mod repository;
