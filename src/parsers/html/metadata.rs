//! HTML 文档元数据处理
//!
//! 读取字符编码声明和标题，以及在转码后把字符编码声明改写为新值。

use html5ever::interface::{Attribute, QualName};
use html5ever::tendril::format_tendril;
use html5ever::tree_builder::create_element;
use html5ever::{namespace_url, ns, LocalName};
use markup5ever_rcdom::{Handle, NodeData, RcDom};

use crate::core::parse_content_type;

use super::dom::{find_nodes, get_node_attr, set_node_attr};

/// 获取文档字符编码
///
/// 支持两种声明格式：
/// 1. HTML5 格式：`<meta charset="utf-8">`
/// 2. HTML4 格式：`<meta http-equiv="content-type" content="text/html; charset=utf-8">`
///
/// 只看第一个声明了字符编码的 meta 标签。
pub fn get_charset(node: &Handle) -> Option<String> {
    for meta_node in find_nodes(node, vec!["html", "head", "meta"]).iter() {
        if let Some(charset) = get_node_attr(meta_node, "charset") {
            return Some(charset);
        }

        if is_content_type_meta(meta_node) {
            if let Some(content) = get_node_attr(meta_node, "content") {
                let (_media_type, charset, _is_base64) = parse_content_type(&content);
                return Some(charset);
            }
        }
    }

    None
}

/// 获取文档标题（第一个 `<title>` 的文本）
pub fn get_title(node: &Handle) -> Option<String> {
    for title_node in find_nodes(node, vec!["html", "head", "title"]).iter() {
        for child_node in title_node.children.borrow().iter() {
            if let NodeData::Text { ref contents } = child_node.data {
                return Some(contents.borrow().to_string());
            }
        }
    }

    None
}

/// 设置字符编码
///
/// 原地修改 DOM：优先更新已有的 `charset` 或 `http-equiv` 声明，
/// 两者都不存在时在 `<head>` 中追加 `<meta charset>`。
pub fn set_charset(dom: &RcDom, charset: &str) {
    for meta_node in find_nodes(&dom.document, vec!["html", "head", "meta"]).iter() {
        if get_node_attr(meta_node, "charset").is_some() {
            set_node_attr(meta_node, "charset", Some(charset.to_string()));
            return;
        }

        if is_content_type_meta(meta_node) && get_node_attr(meta_node, "content").is_some() {
            set_node_attr(
                meta_node,
                "content",
                Some(format!("text/html;charset={charset}")),
            );
            return;
        }
    }

    let meta_charset_node: Handle = create_element(
        dom,
        QualName::new(None, ns!(), LocalName::from("meta")),
        vec![Attribute {
            name: QualName::new(None, ns!(), LocalName::from("charset")),
            value: format_tendril!("{}", charset),
        }],
    );

    if let Some(head_node) = find_nodes(&dom.document, vec!["html", "head"]).first() {
        head_node.children.borrow_mut().push(meta_charset_node);
    }
}

fn is_content_type_meta(meta_node: &Handle) -> bool {
    get_node_attr(meta_node, "http-equiv")
        .unwrap_or_default()
        .eq_ignore_ascii_case("content-type")
}
