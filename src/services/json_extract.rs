//! 从 LLM 的自由文本回复中取出 JSON 数组
//!
//! LLM 的输出不可信：可能带代码块、前后说明文字、甚至多个数组。
//! 这里只取第一个括号配平的 `[...]` 块，字符串内的括号和转义不参与计数。

use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

use crate::error::LlmError;
use crate::utils::logging::truncate_text;

/// 找到第一个配平的 `[...]` 片段
pub fn first_balanced_array(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    let mut search_from = 0;

    while let Some(offset) = text[search_from..].find('[') {
        let start = search_from + offset;
        if let Some(end) = balanced_end(bytes, start) {
            return Some(&text[start..=end]);
        }
        search_from = start + 1;
    }
    None
}

/// 从 `start` 处的 `[` 开始，返回与之配平的 `]` 下标
fn balanced_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'[' | b'{' => depth += 1,
            b']' | b'}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return (b == b']').then_some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// 扫描并解析出 JSON 数组的元素
///
/// 第一个配平片段解析失败时，继续尝试后面的片段。
pub fn extract_json_array(text: &str) -> Result<Vec<JsonValue>, LlmError> {
    let mut rest = text;
    while let Some(candidate) = first_balanced_array(rest) {
        if let Ok(JsonValue::Array(items)) = serde_json::from_str::<JsonValue>(candidate) {
            return Ok(items);
        }
        let consumed = candidate.as_ptr() as usize - rest.as_ptr() as usize + 1;
        rest = &rest[consumed..];
    }
    Err(LlmError::NoJsonArray {
        preview: truncate_text(text, 200),
    })
}

/// 扫描 JSON 数组并逐个元素反序列化，丢弃形状不符的元素
pub fn extract_typed_array<T: DeserializeOwned>(text: &str) -> Result<Vec<T>, LlmError> {
    let items = extract_json_array(text)?;
    Ok(items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect())
}
