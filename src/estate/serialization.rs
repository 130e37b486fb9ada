use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::{Read, Write};

/// 解压 gzip 数据（服务端开启 compression=gzip 时的二进制推送帧）
pub fn decompress_gzip(data: &[u8]) -> Result<Vec<u8>, std::io::Error> {
    let mut decoder = GzDecoder::new(data);
    let mut decompressed = Vec::new();
    decoder.read_to_end(&mut decompressed)?;
    Ok(decompressed)
}

/// 压缩数据为 gzip 格式
pub fn compress_gzip(data: &[u8]) -> Result<Vec<u8>, std::io::Error> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

/// 生成消息 ID（用户 ID + 纳秒时间戳）
pub fn generate_msg_id(user_id: &str) -> String {
    use std::time::SystemTime;
    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{}{}", user_id, nanos)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gzip_roundtrip() {
        let payload = br#"{"event":"notifications","data":[]}"#;
        let compressed = compress_gzip(payload).unwrap();
        let decompressed = decompress_gzip(&compressed).unwrap();
        assert_eq!(decompressed, payload);
    }

    #[test]
    fn test_msg_id_carries_user_prefix() {
        let id = generate_msg_id("u1001");
        assert!(id.starts_with("u1001"));
        assert!(id.len() > "u1001".len());
    }
}
