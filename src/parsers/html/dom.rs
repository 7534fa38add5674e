use encoding_rs::Encoding;
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom};

/// 按给定字符集解码字节并解析为 DOM
///
/// 字符集无法识别时按 UTF-8（有损）解码。
pub fn html_to_dom(data: &[u8], document_encoding: String) -> RcDom {
    let s: String = match Encoding::for_label(document_encoding.as_bytes()) {
        Some(encoding) => {
            let (string, _, _) = encoding.decode(data);
            string.into_owned()
        }
        None => String::from_utf8_lossy(data).into_owned(),
    };

    html_string_to_dom(&s)
}

/// 将 HTML 文本解析为 DOM
///
/// HTML 解析器对任意输入都能容错地产出文档树，读取内存缓冲区不会失败。
pub fn html_string_to_dom(html: &str) -> RcDom {
    parse_document(RcDom::default(), Default::default())
        .from_utf8()
        .read_from(&mut html.as_bytes())
        .unwrap_or_default()
}

/// 查找指定路径的DOM节点
///
/// `node_names` 只有一个名称时匹配任意深度的同名元素，
/// 多个名称时按父子路径逐级匹配（例如 `["html", "head", "meta"]`）。
/// 结果按文档顺序排列。
pub fn find_nodes(node: &Handle, node_names: Vec<&str>) -> Vec<Handle> {
    let mut found_nodes = Vec::new();
    let Some(&node_name) = node_names.first() else {
        return found_nodes;
    };

    match node.data {
        NodeData::Element { ref name, .. } if &*name.local == node_name => {
            if node_names.len() == 1 {
                found_nodes.push(node.clone());
                for child_node in node.children.borrow().iter() {
                    found_nodes.append(&mut find_nodes(child_node, node_names.clone()));
                }
            } else {
                let rest = node_names[1..].to_vec();
                for child_node in node.children.borrow().iter() {
                    found_nodes.append(&mut find_nodes(child_node, rest.clone()));
                }
            }
        }
        NodeData::Element { .. } if node_names.len() > 1 => {
            // 路径必须从当前层级开始匹配
        }
        _ => {
            for child_node in node.children.borrow().iter() {
                found_nodes.append(&mut find_nodes(child_node, node_names.clone()));
            }
        }
    }

    found_nodes
}

/// 获取节点属性值
pub fn get_node_attr(node: &Handle, attr_name: &str) -> Option<String> {
    match &node.data {
        NodeData::Element { attrs, .. } => attrs
            .borrow()
            .iter()
            .find(|attr| &*attr.name.local == attr_name)
            .map(|attr| attr.value.to_string()),
        _ => None,
    }
}

/// 获取节点名称
pub fn get_node_name(node: &Handle) -> Option<&'_ str> {
    match &node.data {
        NodeData::Element { name, .. } => Some(name.local.as_ref()),
        _ => None,
    }
}

/// 设置节点属性，`None` 表示删除该属性
pub fn set_node_attr(node: &Handle, attr_name: &str, attr_value: Option<String>) {
    use html5ever::interface::{Attribute, QualName};
    use html5ever::tendril::format_tendril;
    use html5ever::{namespace_url, ns, LocalName};

    if let NodeData::Element { attrs, .. } = &node.data {
        let mut attrs_mut = attrs.borrow_mut();

        match attr_value {
            Some(attr_value) => {
                let mut found_existing_attr = false;
                for attr in attrs_mut
                    .iter_mut()
                    .filter(|attr| &*attr.name.local == attr_name)
                {
                    attr.value.clear();
                    attr.value.push_slice(&attr_value);
                    found_existing_attr = true;
                }

                if !found_existing_attr {
                    attrs_mut.push(Attribute {
                        name: QualName::new(None, ns!(), LocalName::from(attr_name)),
                        value: format_tendril!("{}", attr_value),
                    });
                }
            }
            None => attrs_mut.retain(|attr| &*attr.name.local != attr_name),
        }
    }
}
