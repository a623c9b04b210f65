// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_8};
use tracing::debug;

/// 从 `Content-Type` 中提取 `charset` 参数
pub fn charset_from_content_type(content_type: &str) -> Option<&str> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        if name.trim().eq_ignore_ascii_case("charset") {
            Some(value.trim().trim_matches(|c| c == '"' || c == '\''))
        } else {
            None
        }
    })
}

/// 把响应体解码为文本
///
/// 优先使用声明的字符集；未声明时若是合法UTF-8则直接使用，
/// 否则交给 chardetng 检测。无法识别的字节按替换字符处理，解码永不失败。
///
/// # 参数
///
/// * `body` - 原始响应体
/// * `content_type` - 响应的内容类型
pub fn decode_body(body: &[u8], content_type: &str) -> String {
    let declared = charset_from_content_type(content_type)
        .and_then(|label| Encoding::for_label(label.as_bytes()));

    let encoding = match declared {
        Some(encoding) => encoding,
        None if std::str::from_utf8(body).is_ok() => UTF_8,
        None => {
            let mut detector = EncodingDetector::new();
            detector.feed(body, true);
            let guess = detector.guess(None, true);
            debug!("Detected body encoding: {}", guess.name());
            guess
        }
    };

    let (decoded, _, had_errors) = encoding.decode(body);
    if had_errors {
        debug!("Body decoded with replacement characters ({})", encoding.name());
    }
    decoded.into_owned()
}
