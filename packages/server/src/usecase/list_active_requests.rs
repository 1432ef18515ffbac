//! UseCase: アクティブな配車リクエストの一覧取得
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ListActiveRequestsUseCase::execute() メソッド
//!
//! ### なぜこのテストが必要か
//! - 「アクティブ」の定義（PENDING のみ）が一貫していることを保証
//! - ドライバー接続時のバックフィルと HTTP API が同じ結果を返すため
//!
//! ### どのような状況を想定しているか
//! - 正常系：PENDING のみが作成の新しい順で返る
//! - 異常系：リクエストが 1 件も無い

use std::sync::Arc;

use crate::domain::{RepositoryError, RideRequest, RideRequestRepository};

/// アクティブな配車リクエスト一覧取得のユースケース
///
/// ドライバーの接続直後のバックフィルと、HTTP の一覧 API の
/// 両方がこのユースケースを通る。
pub struct ListActiveRequestsUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn RideRequestRepository>,
}

impl ListActiveRequestsUseCase {
    /// 新しい ListActiveRequestsUseCase を作成
    pub fn new(repository: Arc<dyn RideRequestRepository>) -> Self {
        Self { repository }
    }

    /// PENDING のリクエストを作成の新しい順で取得
    pub async fn execute(&self) -> Result<Vec<RideRequest>, RepositoryError> {
        self.repository.list_pending().await
    }
}
