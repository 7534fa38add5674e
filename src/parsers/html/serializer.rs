use html5ever::serialize::{serialize, SerializeOpts};
use markup5ever_rcdom::{RcDom, SerializableHandle};

use crate::core::{ConvertError, ConvertResult};

/// 将（可能已被修改的）DOM 序列化为 UTF-8 HTML 文本
pub fn serialize_document(dom: &RcDom) -> ConvertResult<String> {
    let mut buf: Vec<u8> = Vec::new();

    let serializable: SerializableHandle = dom.document.clone().into();
    serialize(&mut buf, &serializable, SerializeOpts::default())
        .map_err(|e| ConvertError::EncodingFailure(format!("无法序列化 DOM: {e}")))?;

    String::from_utf8(buf)
        .map_err(|e| ConvertError::EncodingFailure(format!("序列化结果不是 UTF-8: {e}")))
}
