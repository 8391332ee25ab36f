//! Two-input menu: a static arena of menus and the cursor state machine
//! driven by rotate/confirm.

use core::fmt::Write as _;

use heapless::{String, Vec};
use log::{debug, warn};

use crate::{
    input::InputEvent,
    settings::{SettingChange, SettingKey, SettingsStore},
};


pub const MAX_MENUS: usize = 8;
pub const MAX_NODES: usize = 8;
pub const LINE_CAPACITY: usize = 40;

/// Marker appended to the selected line.
pub const SELECTED_MARKER: &str = " <--";
/// Marker appended to the selected line while its value is being edited.
pub const EDITING_MARKER: &str = " <-";

/// Stable handle of a menu inside a [`MenuTree`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct MenuId(pub(crate) u8);

impl MenuId {
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MenuAction {
    /// Browse the given submenu from its first entry.
    Open(MenuId),
    /// Return to the parent menu, or hide the menu at the top level.
    Back,
    Save,
    RestoreDefaults,
    ResyncSensor,
}

/// Side effects the menu cannot perform itself.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MenuCommand {
    Save,
    RestoreDefaults,
    ResyncSensor,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NodeKind {
    Action(MenuAction),
    ValueEditor(SettingKey),
    CycleSelector(SettingKey),
}

impl NodeKind {
    fn setting(self) -> Option<SettingKey> {
        match self {
            NodeKind::ValueEditor(key) | NodeKind::CycleSelector(key) => Some(key),
            NodeKind::Action(_) => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NodeLabel {
    Text(&'static str),
    /// `prefix`, the node's current setting value, `suffix`.
    Value {
        prefix: &'static str,
        suffix: &'static str,
    },
    /// `prefix` followed by the measured frame rate.
    FrameRate { prefix: &'static str },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct MenuNode {
    pub label: NodeLabel,
    pub kind: NodeKind,
    pub disabled: bool,
}

impl MenuNode {
    pub const fn action(label: NodeLabel, action: MenuAction) -> Self {
        Self {
            label,
            kind: NodeKind::Action(action),
            disabled: false,
        }
    }

    pub const fn editor(prefix: &'static str, suffix: &'static str, key: SettingKey) -> Self {
        Self {
            label: NodeLabel::Value { prefix, suffix },
            kind: NodeKind::ValueEditor(key),
            disabled: false,
        }
    }

    pub const fn selector(prefix: &'static str, key: SettingKey) -> Self {
        Self {
            label: NodeLabel::Value { prefix, suffix: "" },
            kind: NodeKind::CycleSelector(key),
            disabled: false,
        }
    }

    pub const fn with_disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Menu {
    parent: Option<MenuId>,
    nodes: Vec<MenuNode, MAX_NODES>,
}

impl Menu {
    pub fn parent(&self) -> Option<MenuId> {
        self.parent
    }

    pub fn nodes(&self) -> &[MenuNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MenuError {
    TooManyMenus,
    MenuFull(MenuId),
    UnknownMenu(MenuId),
}

/// Menus addressed by [`MenuId`]; the first menu added is the root.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct MenuTree {
    menus: Vec<Menu, MAX_MENUS>,
}

impl MenuTree {
    pub const fn new() -> Self {
        Self { menus: Vec::new() }
    }

    pub fn add_menu(&mut self, parent: Option<MenuId>) -> Result<MenuId, MenuError> {
        if let Some(parent) = parent {
            self.menu(parent).ok_or(MenuError::UnknownMenu(parent))?;
        }

        let id = MenuId(self.menus.len() as u8);
        self.menus
            .push(Menu {
                parent,
                nodes: Vec::new(),
            })
            .map_err(|_| MenuError::TooManyMenus)?;
        Ok(id)
    }

    /// Appends `node` to `menu` and returns its index.
    pub fn push_node(&mut self, menu: MenuId, node: MenuNode) -> Result<usize, MenuError> {
        let target = self
            .menus
            .get_mut(menu.index())
            .ok_or(MenuError::UnknownMenu(menu))?;
        target
            .nodes
            .push(node)
            .map_err(|_| MenuError::MenuFull(menu))?;
        Ok(target.nodes.len() - 1)
    }

    pub fn set_disabled(
        &mut self,
        menu: MenuId,
        index: usize,
        disabled: bool,
    ) -> Result<(), MenuError> {
        let node = self
            .menus
            .get_mut(menu.index())
            .and_then(|m| m.nodes.get_mut(index))
            .ok_or(MenuError::UnknownMenu(menu))?;
        node.disabled = disabled;
        Ok(())
    }

    pub fn menu(&self, id: MenuId) -> Option<&Menu> {
        self.menus.get(id.index())
    }

    pub fn root(&self) -> Option<MenuId> {
        (!self.menus.is_empty()).then_some(MenuId(0))
    }

    fn node(&self, menu: MenuId, index: usize) -> Option<&MenuNode> {
        self.menu(menu).and_then(|m| m.nodes.get(index))
    }

    /// The viewer's menu layout.
    pub fn standard() -> Result<Self, MenuError> {
        let mut tree = Self::new();
        let root = tree.add_menu(None)?;
        let image = tree.add_menu(Some(root))?;
        let align = tree.add_menu(Some(root))?;
        let store = tree.add_menu(Some(root))?;

        let back = MenuNode::action(NodeLabel::Text("Back"), MenuAction::Back);

        for node in [
            MenuNode::action(NodeLabel::Text("Image Settings"), MenuAction::Open(image)),
            MenuNode::action(NodeLabel::Text("Align Settings"), MenuAction::Open(align)),
            MenuNode::action(NodeLabel::Text("Store"), MenuAction::Open(store)),
            MenuNode::selector("Color ", SettingKey::Color),
            MenuNode::action(
                NodeLabel::FrameRate { prefix: "FPS " },
                MenuAction::ResyncSensor,
            ),
            MenuNode::action(NodeLabel::Text("Exit"), MenuAction::Back),
        ] {
            tree.push_node(root, node)?;
        }

        for node in [
            MenuNode::editor("Brightness ", "", SettingKey::Brightness),
            MenuNode::editor("Contrast ", "", SettingKey::Contrast),
            MenuNode::selector("Scene ", SettingKey::Scene),
            back,
        ] {
            tree.push_node(image, node)?;
        }

        for node in [
            MenuNode::editor("X : ", "", SettingKey::XOffset),
            MenuNode::editor("Y : ", "", SettingKey::YOffset),
            MenuNode::editor("Scale ", "x", SettingKey::Scale),
            back,
        ] {
            tree.push_node(align, node)?;
        }

        for node in [
            MenuNode::action(NodeLabel::Text("Save"), MenuAction::Save),
            MenuNode::action(NodeLabel::Text("Restore"), MenuAction::RestoreDefaults),
            back,
        ] {
            tree.push_node(store, node)?;
        }

        Ok(tree)
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum MenuState {
    #[default]
    Hidden,
    Browsing {
        menu: MenuId,
        selected: usize,
    },
    Editing {
        menu: MenuId,
        selected: usize,
        editor: SettingKey,
    },
}

/// Result of one rotate/confirm step.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MenuOutcome {
    pub change: Option<SettingChange>,
    pub command: Option<MenuCommand>,
}

impl MenuOutcome {
    const NONE: Self = Self {
        change: None,
        command: None,
    };

    fn change(change: SettingChange) -> Self {
        Self {
            change: Some(change),
            command: None,
        }
    }

    fn command(command: MenuCommand) -> Self {
        Self {
            change: None,
            command: Some(command),
        }
    }
}

/// Values shown in labels that do not live in the settings store.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MenuContext {
    pub fps: Option<f32>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MenuLine {
    pub text: String<LINE_CAPACITY>,
    pub selected: bool,
    pub editing: bool,
    pub disabled: bool,
}

impl MenuLine {
    pub fn marker(&self) -> &'static str {
        match (self.selected, self.editing) {
            (true, true) => EDITING_MARKER,
            (true, false) => SELECTED_MARKER,
            _ => "",
        }
    }
}

/// Renderable snapshot of the active menu.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MenuView {
    pub menu: MenuId,
    pub lines: Vec<MenuLine, MAX_NODES>,
}

#[derive(Clone, Debug)]
pub struct MenuNavigator {
    tree: MenuTree,
    state: MenuState,
}

impl MenuNavigator {
    pub const fn new(tree: MenuTree) -> Self {
        Self {
            tree,
            state: MenuState::Hidden,
        }
    }

    pub fn state(&self) -> MenuState {
        self.state
    }

    pub fn tree(&self) -> &MenuTree {
        &self.tree
    }

    pub fn is_visible(&self) -> bool {
        self.state != MenuState::Hidden
    }

    pub fn apply(&mut self, event: InputEvent, store: &mut SettingsStore) -> MenuOutcome {
        match event.direction() {
            Some(direction) => self.rotate(direction, store),
            None => self.confirm(store),
        }
    }

    /// Moves the cursor, or steps the edited value, by one in `direction`.
    pub fn rotate(&mut self, direction: i8, store: &mut SettingsStore) -> MenuOutcome {
        let direction = direction.signum();
        if direction == 0 {
            return MenuOutcome::NONE;
        }

        match self.state {
            MenuState::Hidden => MenuOutcome::NONE,
            MenuState::Editing { editor, .. } => match store.adjust(editor, i32::from(direction)) {
                Ok(change) => MenuOutcome::change(change),
                Err(err) => {
                    warn!("menu: edit refused key={} err={:?}", editor.name(), err);
                    MenuOutcome::NONE
                }
            },
            MenuState::Browsing { menu, selected } => {
                let Some(nodes) = self.tree.menu(menu).map(Menu::nodes) else {
                    return MenuOutcome::NONE;
                };
                let len = nodes.len();
                if len == 0 {
                    return MenuOutcome::NONE;
                }

                let mut next = selected;
                for _ in 0..len {
                    next = if direction > 0 {
                        (next + 1) % len
                    } else {
                        (next + len - 1) % len
                    };
                    if !nodes[next].disabled {
                        self.state = MenuState::Browsing {
                            menu,
                            selected: next,
                        };
                        break;
                    }
                }

                debug!(
                    "menu: rotate menu={} selected={}/{}",
                    menu.index(),
                    self.selected().unwrap_or(selected),
                    len
                );
                MenuOutcome::NONE
            }
        }
    }

    pub fn confirm(&mut self, store: &mut SettingsStore) -> MenuOutcome {
        match self.state {
            MenuState::Hidden => {
                if let Some(root) = self.tree.root() {
                    debug!("menu: show");
                    self.enter(root);
                }
                MenuOutcome::NONE
            }
            MenuState::Editing { menu, selected, .. } => {
                debug!("menu: stop editing menu={} selected={}", menu.index(), selected);
                self.state = MenuState::Browsing { menu, selected };
                MenuOutcome::NONE
            }
            MenuState::Browsing { menu, selected } => {
                let Some(node) = self.tree.node(menu, selected).copied() else {
                    return MenuOutcome::NONE;
                };
                if node.disabled {
                    debug!("menu: ignore disabled menu={} selected={}", menu.index(), selected);
                    return MenuOutcome::NONE;
                }

                match node.kind {
                    NodeKind::Action(action) => self.run_action(menu, action),
                    NodeKind::ValueEditor(key) => {
                        debug!("menu: edit key={}", key.name());
                        self.state = MenuState::Editing {
                            menu,
                            selected,
                            editor: key,
                        };
                        MenuOutcome::NONE
                    }
                    NodeKind::CycleSelector(key) => match store.advance(key) {
                        Ok(change) => MenuOutcome::change(change),
                        Err(err) => {
                            warn!("menu: cycle refused key={} err={:?}", key.name(), err);
                            MenuOutcome::NONE
                        }
                    },
                }
            }
        }
    }

    fn run_action(&mut self, current: MenuId, action: MenuAction) -> MenuOutcome {
        match action {
            MenuAction::Open(child) => {
                if self.tree.menu(child).is_some() {
                    debug!("menu: open menu={}", child.index());
                    self.enter(child);
                } else {
                    warn!("menu: open unknown menu={}", child.index());
                }
                MenuOutcome::NONE
            }
            MenuAction::Back => {
                match self.tree.menu(current).and_then(Menu::parent) {
                    Some(parent) => {
                        debug!("menu: back menu={} -> {}", current.index(), parent.index());
                        self.enter(parent);
                    }
                    None => {
                        debug!("menu: hide");
                        self.state = MenuState::Hidden;
                    }
                }
                MenuOutcome::NONE
            }
            MenuAction::Save => MenuOutcome::command(MenuCommand::Save),
            MenuAction::RestoreDefaults => MenuOutcome::command(MenuCommand::RestoreDefaults),
            MenuAction::ResyncSensor => MenuOutcome::command(MenuCommand::ResyncSensor),
        }
    }

    fn enter(&mut self, menu: MenuId) {
        self.state = MenuState::Browsing { menu, selected: 0 };
    }

    fn selected(&self) -> Option<usize> {
        match self.state {
            MenuState::Browsing { selected, .. } | MenuState::Editing { selected, .. } => {
                Some(selected)
            }
            MenuState::Hidden => None,
        }
    }

    /// Lines of the active menu, `None` while hidden.
    pub fn view(&self, store: &SettingsStore, ctx: &MenuContext) -> Option<MenuView> {
        let (menu, selected, editing) = match self.state {
            MenuState::Hidden => return None,
            MenuState::Browsing { menu, selected } => (menu, selected, false),
            MenuState::Editing { menu, selected, .. } => (menu, selected, true),
        };

        let mut view = MenuView {
            menu,
            lines: Vec::new(),
        };
        for (index, node) in self.tree.menu(menu)?.nodes().iter().enumerate() {
            let is_selected = index == selected;
            let line = MenuLine {
                text: node_text(node, store, ctx),
                selected: is_selected,
                editing: is_selected && editing,
                disabled: node.disabled,
            };
            // A menu never holds more than MAX_NODES nodes.
            let _ = view.lines.push(line);
        }
        Some(view)
    }
}

fn node_text(node: &MenuNode, store: &SettingsStore, ctx: &MenuContext) -> String<LINE_CAPACITY> {
    let mut text = String::new();
    // Overlong labels are cut short; the row is still drawn.
    let _ = match node.label {
        NodeLabel::Text(label) => text.write_str(label),
        NodeLabel::Value { prefix, suffix } => match node.kind.setting() {
            Some(key) => write!(text, "{prefix}{}{suffix}", store.get(key)),
            None => write!(text, "{prefix}{suffix}"),
        },
        NodeLabel::FrameRate { prefix } => match ctx.fps {
            Some(fps) => write!(text, "{prefix}{fps:.1}"),
            None => write!(text, "{prefix}--"),
        },
    };
    text
}
