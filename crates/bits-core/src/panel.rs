use std::cell::{
  Cell,
  RefCell
};
use std::collections::BTreeMap;
use std::rc::Rc;

use serde::{
  Deserialize,
  Serialize
};
use tracing::{
  debug,
  trace
};

/// Bounding box in viewport coordinates.
#[derive(
  Debug, Clone, Copy, Default, PartialEq,
)]
pub struct Rect {
  pub left:   f64,
  pub top:    f64,
  pub width:  f64,
  pub height: f64
}

#[derive(
  Debug, Clone, Copy, Default, PartialEq,
)]
pub struct ScrollOffset {
  pub x: f64,
  pub y: f64
}

#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum HorizontalAlign {
  #[default]
  Left,
  Right
}

/// Document coordinates for a floating panel. Exactly one of `left` and
/// `right` is set, depending on the alignment.
#[derive(
  Debug, Clone, Copy, PartialEq,
)]
pub struct PanelPosition {
  pub top:   f64,
  pub left:  Option<f64>,
  pub right: Option<f64>,
  pub width: f64
}

#[must_use]
pub fn compute_panel_position(
  trigger: Rect,
  scroll: ScrollOffset,
  viewport_width: f64,
  align: HorizontalAlign
) -> PanelPosition {
  let top =
    trigger.top + trigger.height + scroll.y;
  let left = trigger.left + scroll.x;
  match align {
    | HorizontalAlign::Left => {
      PanelPosition {
        top,
        left: Some(left),
        right: None,
        width: trigger.width
      }
    }
    | HorizontalAlign::Right => {
      PanelPosition {
        top,
        left: None,
        right: Some(
          viewport_width
            - (left + trigger.width)
        ),
        width: trigger.width
      }
    }
  }
}

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
)]
pub struct ElementId(pub u32);

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
)]
pub struct ListenerId(u64);

/// Handler state of one subscription: the elements that count as
/// inside, and the flag it raises on an outside pointer-down.
#[derive(Debug)]
struct Listener {
  trigger:   ElementId,
  panel:     ElementId,
  dismissed: Rc<Cell<bool>>
}

impl Listener {
  fn is_inside(
    &self,
    path: &[ElementId]
  ) -> bool {
    path.iter().any(|node| {
      *node == self.trigger
        || *node == self.panel
    })
  }
}

#[derive(Debug, Default)]
struct Listeners {
  next_id: u64,
  active:  BTreeMap<ListenerId, Listener>
}

/// Document-level pointer-down listener table shared by every panel in
/// one window.
#[derive(Debug, Clone, Default)]
pub struct ListenerRegistry {
  inner: Rc<RefCell<Listeners>>
}

impl ListenerRegistry {
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  #[must_use]
  pub fn active_count(&self) -> usize {
    self.inner.borrow().active.len()
  }

  /// Delivers a document pointer-down to every live listener. `path`
  /// is the target element followed by its ancestors. Listeners whose
  /// elements are not on the path are dismissed and detached. Returns
  /// how many fired.
  pub fn dispatch_pointer_down(
    &self,
    path: &[ElementId]
  ) -> usize {
    let mut inner = self.inner.borrow_mut();
    let fired: Vec<ListenerId> = inner
      .active
      .iter()
      .filter(|(_, listener)| {
        !listener.is_inside(path)
      })
      .map(|(id, _)| *id)
      .collect();

    for id in &fired {
      if let Some(listener) =
        inner.active.remove(id)
      {
        listener.dismissed.set(true);
        trace!(?id, "outside pointer-down delivered");
      }
    }
    fired.len()
  }

  fn attach(
    &self,
    listener: Listener
  ) -> ListenerId {
    let mut inner = self.inner.borrow_mut();
    let id = ListenerId(inner.next_id);
    inner.next_id += 1;
    inner.active.insert(id, listener);
    trace!(?id, "attached pointer-down listener");
    id
  }

  fn detach(&self, id: ListenerId) {
    if self
      .inner
      .borrow_mut()
      .active
      .remove(&id)
      .is_some()
    {
      trace!(?id, "detached pointer-down listener");
    }
  }
}

/// Live outside-click listener. Detaches when dropped.
#[derive(Debug)]
pub struct OutsideClickSubscription {
  registry: ListenerRegistry,
  id:       ListenerId
}

impl OutsideClickSubscription {
  fn attach(
    registry: &ListenerRegistry,
    trigger: ElementId,
    panel: ElementId,
    dismissed: Rc<Cell<bool>>
  ) -> Self {
    Self {
      registry: registry.clone(),
      id:       registry.attach(Listener {
        trigger,
        panel,
        dismissed
      })
    }
  }
}

impl Drop for OutsideClickSubscription {
  fn drop(&mut self) {
    self.registry.detach(self.id);
  }
}

#[derive(Debug)]
struct OpenState {
  position:      PanelPosition,
  _subscription: OutsideClickSubscription
}

/// A floating panel anchored below a trigger element.
#[derive(Debug)]
pub struct AnchoredPanel {
  trigger:   ElementId,
  panel:     ElementId,
  align:     HorizontalAlign,
  registry:  ListenerRegistry,
  open:      Option<OpenState>,
  dismissed: Rc<Cell<bool>>
}

impl AnchoredPanel {
  #[must_use]
  pub fn new(
    trigger: ElementId,
    panel: ElementId,
    align: HorizontalAlign,
    registry: &ListenerRegistry
  ) -> Self {
    Self {
      trigger,
      panel,
      align,
      registry: registry.clone(),
      open: None,
      dismissed: Rc::new(Cell::new(false))
    }
  }

  /// False as soon as the subscription delivered an outside click,
  /// even before the panel settles.
  #[must_use]
  pub fn is_open(&self) -> bool {
    self.open.is_some()
      && !self.dismissed.get()
  }

  #[must_use]
  pub fn position(
    &self
  ) -> Option<PanelPosition> {
    self
      .open
      .as_ref()
      .filter(|_| !self.dismissed.get())
      .map(|state| state.position)
  }

  /// Drops the open state once an outside click was delivered.
  /// Returns whether it did.
  pub fn settle(&mut self) -> bool {
    if !self.dismissed.replace(false) {
      return false;
    }
    if self.open.take().is_some() {
      debug!(trigger = ?self.trigger, "dismissed by outside click");
      return true;
    }
    false
  }

  /// Opens the panel. Placement is computed only on the closed→open
  /// transition; opening an open panel keeps the old position.
  pub fn open(
    &mut self,
    trigger_rect: Rect,
    scroll: ScrollOffset,
    viewport_width: f64
  ) -> PanelPosition {
    self.settle();
    if let Some(state) = &self.open {
      return state.position;
    }

    let position = compute_panel_position(
      trigger_rect,
      scroll,
      viewport_width,
      self.align
    );
    debug!(
      trigger = ?self.trigger,
      ?position,
      "panel opened"
    );
    self.open = Some(OpenState {
      position,
      _subscription:
        OutsideClickSubscription::attach(
          &self.registry,
          self.trigger,
          self.panel,
          Rc::clone(&self.dismissed)
        )
    });
    position
  }

  pub fn close(&mut self) {
    self.dismissed.set(false);
    if self.open.take().is_some() {
      debug!(trigger = ?self.trigger, "panel closed");
    }
  }

  pub fn toggle(
    &mut self,
    trigger_rect: Rect,
    scroll: ScrollOffset,
    viewport_width: f64
  ) -> bool {
    if self.is_open() {
      self.close();
    } else {
      self.open(
        trigger_rect,
        scroll,
        viewport_width
      );
    }
    self.is_open()
  }

  /// Feeds a document pointer-down through the shared registry, then
  /// settles this panel. Returns whether this panel was dismissed.
  pub fn pointer_down(
    &mut self,
    path: &[ElementId]
  ) -> bool {
    if !self.is_open() {
      return false;
    }
    self.registry.dispatch_pointer_down(path);
    self.settle()
  }
}
