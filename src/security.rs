//! Security Module
//!
//! 入力ファイルの読み込み時に適用する制限を定義するモジュール。

use std::io::Read;

use crate::error::CeMatchError;

/// セキュリティ設定
///
/// ワークブック読み込み時のサイズ制限を定義します。
#[derive(Debug, Clone)]
pub(crate) struct SecurityConfig {
    /// 入力ファイルの最大サイズ（バイト）
    /// デフォルト: 2GB (2_147_483_648 bytes)
    pub max_input_file_size: u64,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_input_file_size: 2_147_483_648, // 2GB
        }
    }
}

impl SecurityConfig {
    /// 読み込んだバイト数が上限以内かを検証
    pub fn check_input_size(&self, bytes_read: u64) -> Result<(), CeMatchError> {
        if bytes_read > self.max_input_file_size {
            return Err(CeMatchError::SecurityViolation(format!(
                "Input file size exceeds maximum: {} bytes (max: {} bytes)",
                bytes_read, self.max_input_file_size
            )));
        }
        Ok(())
    }

    /// 上限を1バイト超えるまでだけ読み込む
    ///
    /// 上限を超える入力は全体をメモリに載せる前に打ち切り、
    /// `SecurityViolation`を返します。
    pub fn read_input<R: Read>(&self, reader: R) -> Result<Vec<u8>, CeMatchError> {
        let mut buffer = Vec::new();
        let bytes_read = reader
            .take(self.max_input_file_size.saturating_add(1))
            .read_to_end(&mut buffer)?;
        self.check_input_size(bytes_read as u64)?;
        Ok(buffer)
    }
}
