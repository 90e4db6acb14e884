use super::kind::{ValueType, WidgetKind};
use super::value::WidgetValue;
use crate::error::{Result, TetherError};
use tracing::{debug, trace};

/// Index of a widget inside its [`WidgetTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WidgetId(usize);

impl WidgetId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Description of a widget to add to a tree.
#[derive(Debug, Clone)]
pub struct WidgetSpec {
    pub name: String,
    pub label: String,
    pub kind: WidgetKind,
    pub readonly: bool,
    pub value: WidgetValue,
}

impl WidgetSpec {
    pub fn new<N: Into<String>, L: Into<String>>(
        kind: WidgetKind,
        name: N,
        label: L,
        value: WidgetValue,
    ) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            kind,
            readonly: false,
            value,
        }
    }

    pub fn section<N: Into<String>, L: Into<String>>(name: N, label: L) -> Self {
        Self::new(WidgetKind::Section, name, label, WidgetValue::None)
    }

    pub fn text<N: Into<String>, L: Into<String>>(name: N, label: L, value: &str) -> Self {
        Self::new(WidgetKind::Text, name, label, value.into())
    }

    pub fn radio<N: Into<String>, L: Into<String>>(name: N, label: L, value: &str) -> Self {
        Self::new(WidgetKind::Radio, name, label, value.into())
    }

    pub fn range<N: Into<String>, L: Into<String>>(name: N, label: L, value: i64) -> Self {
        Self::new(WidgetKind::Range, name, label, value.into())
    }

    pub fn toggle<N: Into<String>, L: Into<String>>(name: N, label: L, on: bool) -> Self {
        Self::new(WidgetKind::Toggle, name, label, on.into())
    }

    pub fn menu<N: Into<String>, L: Into<String>>(name: N, label: L, value: i64) -> Self {
        Self::new(WidgetKind::Menu, name, label, value.into())
    }

    pub fn button<N: Into<String>, L: Into<String>>(name: N, label: L) -> Self {
        Self::new(WidgetKind::Button, name, label, WidgetValue::Integer(0))
    }

    pub fn date<N: Into<String>, L: Into<String>>(
        name: N,
        label: L,
        value: chrono::DateTime<chrono::Utc>,
    ) -> Self {
        Self::new(WidgetKind::Date, name, label, value.into())
    }

    pub fn readonly(mut self) -> Self {
        self.readonly = true;
        self
    }
}

#[derive(Debug, Clone)]
struct WidgetNode {
    name: String,
    label: String,
    kind: WidgetKind,
    readonly: bool,
    value: WidgetValue,
    parent: Option<WidgetId>,
    children: Vec<WidgetId>,
}

/// Borrowed view of a single widget.
#[derive(Debug, Clone, Copy)]
pub struct Widget<'a> {
    id: WidgetId,
    node: &'a WidgetNode,
}

impl<'a> Widget<'a> {
    pub fn id(&self) -> WidgetId {
        self.id
    }

    pub fn name(&self) -> &'a str {
        &self.node.name
    }

    pub fn label(&self) -> &'a str {
        &self.node.label
    }

    pub fn kind(&self) -> WidgetKind {
        self.node.kind
    }

    pub fn value_type(&self) -> ValueType {
        self.node.kind.value_type()
    }

    pub fn value_type_name(&self) -> &'static str {
        self.value_type().name()
    }

    pub fn readonly(&self) -> bool {
        self.node.readonly
    }

    pub fn value(&self) -> &'a WidgetValue {
        &self.node.value
    }

    pub fn parent(&self) -> Option<WidgetId> {
        self.node.parent
    }

    pub fn children(&self) -> &'a [WidgetId] {
        &self.node.children
    }
}

/// A camera configuration tree.
///
/// The tree is a single arena rooted at a Window widget. Children are owned by
/// the arena; parent links are indices used only for lookup. The tree is
/// released as a whole, after which every accessor fails with `Closed`.
#[derive(Debug, Clone)]
pub struct WidgetTree {
    nodes: Vec<WidgetNode>,
    released: bool,
}

impl WidgetTree {
    /// Create a tree holding only an empty Window root.
    pub fn new<L: Into<String>>(label: L) -> Self {
        Self {
            nodes: vec![WidgetNode {
                name: String::new(),
                label: label.into(),
                kind: WidgetKind::Window,
                readonly: false,
                value: WidgetValue::None,
                parent: None,
                children: Vec::new(),
            }],
            released: false,
        }
    }

    pub fn root(&self) -> WidgetId {
        WidgetId(0)
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Number of widgets in the tree, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Release the whole tree. Releasing twice is a no-op.
    pub fn release(&mut self) {
        if self.released {
            trace!("Widget tree already released");
            return;
        }
        debug!("Releasing widget tree with {} widgets", self.nodes.len());
        self.nodes.clear();
        self.nodes.shrink_to_fit();
        self.released = true;
    }

    fn ensure_live(&self) -> Result<()> {
        if self.released {
            return Err(TetherError::Closed("widget tree"));
        }
        Ok(())
    }

    fn node(&self, id: WidgetId) -> Result<&WidgetNode> {
        self.ensure_live()?;
        self.nodes
            .get(id.0)
            .ok_or_else(|| TetherError::NotFound(format!("widget #{}", id.0)))
    }

    fn node_mut(&mut self, id: WidgetId) -> Result<&mut WidgetNode> {
        self.ensure_live()?;
        self.nodes
            .get_mut(id.0)
            .ok_or_else(|| TetherError::NotFound(format!("widget #{}", id.0)))
    }

    pub fn widget(&self, id: WidgetId) -> Result<Widget<'_>> {
        let node = self.node(id)?;
        Ok(Widget { id, node })
    }

    /// Append a widget under `parent`.
    pub fn add_child(&mut self, parent: WidgetId, spec: WidgetSpec) -> Result<WidgetId> {
        let parent_node = self.node(parent)?;
        if !parent_node.kind.is_container() {
            return Err(TetherError::Unsupported(format!(
                "{} widget '{}' cannot hold children",
                parent_node.kind, parent_node.name
            )));
        }
        if parent_node
            .children
            .iter()
            .any(|child| self.nodes[child.0].name == spec.name)
        {
            return Err(TetherError::DuplicateWidget(spec.name));
        }
        check_assignable(&spec.name, spec.kind, &spec.value)?;

        let id = WidgetId(self.nodes.len());
        self.nodes.push(WidgetNode {
            name: spec.name,
            label: spec.label,
            kind: spec.kind,
            readonly: spec.readonly,
            value: spec.value,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        Ok(id)
    }

    pub fn set_label<L: Into<String>>(&mut self, id: WidgetId, label: L) -> Result<()> {
        self.node_mut(id)?.label = label.into();
        Ok(())
    }

    /// Exact name lookup among the immediate children of `node`.
    pub fn child(&self, node: WidgetId, name: &str) -> Result<WidgetId> {
        self.node(node)?
            .children
            .iter()
            .copied()
            .find(|child| self.nodes[child.0].name == name)
            .ok_or_else(|| TetherError::NotFound(name.to_string()))
    }

    /// Resolve a `/` separated path of widget names starting at the root.
    pub fn lookup(&self, path: &str) -> Result<WidgetId> {
        path.split('/')
            .filter(|segment| !segment.is_empty())
            .try_fold(self.root(), |node, segment| self.child(node, segment))
            .map_err(|err| match err {
                TetherError::NotFound(_) => TetherError::NotFound(path.to_string()),
                other => other,
            })
    }

    /// Current value of a widget. Structural widgets yield `WidgetValue::None`.
    pub fn value(&self, id: WidgetId) -> Result<WidgetValue> {
        let node = self.node(id)?;
        match node.kind.value_type() {
            ValueType::Structural => Ok(WidgetValue::None),
            _ => Ok(node.value.clone()),
        }
    }

    /// Assign a new value, validated against the widget's kind.
    ///
    /// The tree is left untouched on failure.
    pub fn set_value(&mut self, id: WidgetId, value: WidgetValue) -> Result<()> {
        let node = self.node_mut(id)?;
        check_assignable(&node.name, node.kind, &value)?;
        if node.readonly {
            return Err(TetherError::ReadOnly(node.name.clone()));
        }
        if node.kind.value_type() == ValueType::Structural {
            return Ok(());
        }

        debug!("Setting widget '{}' to {:?}", node.name, value);
        node.value = value;
        Ok(())
    }

    /// Widget ids in depth-first pre-order, root first.
    pub fn walk(&self) -> Result<Vec<WidgetId>> {
        self.ensure_live()?;
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root()];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.nodes[id.0].children.iter().rev().copied());
        }
        Ok(order)
    }

    /// `/` separated name path of a widget relative to the root.
    pub fn path_of(&self, id: WidgetId) -> Result<String> {
        let mut segments = Vec::new();
        let mut current = Some(id);
        while let Some(node_id) = current {
            let node = self.node(node_id)?;
            if node.parent.is_some() {
                segments.push(node.name.as_str());
            }
            current = node.parent;
        }
        segments.reverse();
        Ok(format!("/{}", segments.join("/")))
    }
}

fn check_assignable(name: &str, kind: WidgetKind, value: &WidgetValue) -> Result<()> {
    if value.value_type() == kind.value_type() {
        return Ok(());
    }
    Err(TetherError::TypeMismatch {
        widget: name.to_string(),
        expected: kind.value_type(),
        found: value.type_name(),
    })
}
