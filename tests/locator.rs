use mirage::window::{HostError, LocateError, WindowLocator, WindowRect, WindowSystem};
use std::collections::HashMap;

/// In-memory window tree keyed by integer handles.
#[derive(Default)]
struct FakeDesktop {
    top_level: Vec<(u32, &'static str, &'static str)>,
    children: HashMap<u32, Vec<u32>>,
    classes: HashMap<u32, &'static str>,
    rects: HashMap<u32, WindowRect>,
    dead: Vec<u32>,
}

impl FakeDesktop {
    fn child(&mut self, parent: u32, handle: u32, class: &'static str, rect: WindowRect) {
        self.children.entry(parent).or_default().push(handle);
        self.classes.insert(handle, class);
        self.rects.insert(handle, rect);
    }
}

impl WindowSystem for FakeDesktop {
    type Handle = u32;

    fn find_window(&self, class: &str, title: &str) -> Option<u32> {
        self.top_level
            .iter()
            .find(|(_, c, t)| *c == class && *t == title)
            .map(|(h, _, _)| *h)
    }

    fn descendants(&self, parent: u32) -> Vec<u32> {
        let mut out = Vec::new();
        for child in self.children.get(&parent).cloned().unwrap_or_default() {
            out.push(child);
            out.extend(self.descendants(child));
        }
        out
    }

    fn class_of(&self, window: u32) -> Option<String> {
        self.classes.get(&window).map(|c| c.to_string())
    }

    fn geometry(&self, window: u32) -> Option<WindowRect> {
        self.rects.get(&window).copied()
    }

    fn is_alive(&self, window: u32) -> bool {
        !self.dead.contains(&window)
    }
}

fn task_manager() -> FakeDesktop {
    let mut desktop = FakeDesktop {
        top_level: vec![(1, "TaskManagerWindow", "Task Manager")],
        ..Default::default()
    };
    desktop.child(1, 10, "DirectUIHWND", WindowRect::new(0, 0, 800, 600));
    desktop.child(10, 11, "CvChartWindow", WindowRect::new(0, 0, 100, 50));
    desktop.child(10, 12, "CvChartWindow", WindowRect::new(0, 0, 400, 300));
    desktop.child(12, 13, "CvChartWindow", WindowRect::new(0, 0, 300, 400));
    desktop.child(10, 14, "CvChartWindowEx", WindowRect::new(0, 0, 900, 900));
    desktop
}

#[test]
fn host_lookup_matches_class_and_title() {
    let desktop = task_manager();
    let locator = WindowLocator::new(&desktop);
    assert_eq!(locator.locate_host("Task Manager", "TaskManagerWindow").unwrap(), 1);
    assert!(matches!(
        locator.locate_host("Task Manager", "Notepad"),
        Err(LocateError::HostNotFound { .. })
    ));
}

#[test]
fn largest_exact_class_match_wins_and_first_wins_ties() {
    let desktop = task_manager();
    let locator = WindowLocator::new(&desktop);
    // 12 and 13 share the largest area; 12 is enumerated first
    assert_eq!(locator.locate_embed_target(1, "CvChartWindow").unwrap(), 12);
}

#[test]
fn empty_child_class_embeds_into_host() {
    let desktop = task_manager();
    let locator = WindowLocator::new(&desktop);
    assert_eq!(locator.locate_embed_target(1, "").unwrap(), 1);
}

#[test]
fn missing_child_class_is_reported() {
    let desktop = task_manager();
    let locator = WindowLocator::new(&desktop);
    assert!(matches!(
        locator.locate_embed_target(1, "Chart"),
        Err(LocateError::EmbedTargetNotFound { .. })
    ));
}

#[test]
fn geometry_read_revalidates_the_handle() {
    let mut desktop = task_manager();
    assert_eq!(desktop.live_geometry(12).unwrap().width(), 400);
    desktop.dead.push(12);
    assert!(matches!(desktop.live_geometry(12), Err(HostError::Lost(_))));
    assert!(matches!(desktop.live_geometry(99), Err(HostError::Geometry(_))));
}
