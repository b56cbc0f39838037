use std::sync::Arc;

use eframe::egui::{self, Align, Context, Layout};
use log::info;

use crate::config::{RefreshPolicy, TopologySource};
use crate::topology::TopologyProvider;

mod fetch;
mod graph;
mod highlight;
mod physics;
mod render_utils;
mod schedule;
mod ui;
mod view;

use render_utils::Theme;
use ui::{DetailPanel, DeviceDirectory};
use view::{TopologyView, ViewKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Tab {
    Topology,
    Path,
    Devices,
}

impl Tab {
    const ALL: [Self; 3] = [Self::Topology, Self::Path, Self::Devices];

    fn label(self) -> &'static str {
        match self {
            Self::Topology => "Topology",
            Self::Path => "Path Finder",
            Self::Devices => "Devices",
        }
    }
}

/// Content of the central area. Only the active tab owns a view; leaving a
/// tab drops it, which tears down its timers and fetches.
enum Page {
    Graph(Box<TopologyView>),
    Devices(Box<DeviceDirectory>),
}

pub struct NocTopologyApp {
    source: TopologySource,
    refresh: RefreshPolicy,
    provider: Arc<dyn TopologyProvider>,
    tab: Tab,
    theme: Theme,
    page: Page,
    details: DetailPanel,
}

fn visuals(theme: Theme) -> egui::Visuals {
    match theme {
        Theme::Dark => egui::Visuals::dark(),
        Theme::Light => egui::Visuals::light(),
    }
}

impl NocTopologyApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        source: TopologySource,
        refresh: RefreshPolicy,
        provider: Arc<dyn TopologyProvider>,
    ) -> Self {
        let app = Self::with_provider(source, refresh, provider);
        cc.egui_ctx.set_visuals(visuals(app.theme));
        app
    }

    fn with_provider(
        source: TopologySource,
        refresh: RefreshPolicy,
        provider: Arc<dyn TopologyProvider>,
    ) -> Self {
        info!("reading topology from {}", provider.describe());
        let theme = Theme::default();
        let tab = Tab::Topology;
        let page = Self::open_page(tab, &provider, refresh, theme);
        Self {
            source,
            refresh,
            provider,
            tab,
            theme,
            page,
            details: DetailPanel::default(),
        }
    }

    fn open_page(
        tab: Tab,
        provider: &Arc<dyn TopologyProvider>,
        refresh: RefreshPolicy,
        theme: Theme,
    ) -> Page {
        let graph = |kind| {
            Page::Graph(Box::new(TopologyView::new(
                kind,
                Arc::clone(provider),
                refresh,
                theme,
            )))
        };
        match tab {
            Tab::Topology => graph(ViewKind::Topology),
            Tab::Path => graph(ViewKind::Path),
            Tab::Devices => Page::Devices(Box::new(DeviceDirectory::new(Arc::clone(provider)))),
        }
    }

    fn switch_tab(&mut self, tab: Tab) {
        if self.tab == tab {
            return;
        }

        if let Page::Graph(view) = &mut self.page {
            view.destroy();
        }
        self.tab = tab;
        self.page = Self::open_page(tab, &self.provider, self.refresh, self.theme);
    }

    fn toggle_theme(&mut self, ctx: &Context) {
        self.theme = self.theme.toggled();
        ctx.set_visuals(visuals(self.theme));
        if let Page::Graph(view) = &mut self.page {
            view.set_theme(self.theme);
        }
    }

    fn source_label(&self) -> String {
        match &self.source {
            TopologySource::Api(url) => format!("api: {url}"),
            TopologySource::File(path) => format!("file: {}", path.display()),
        }
    }

    fn draw_top_bar(&mut self, ctx: &Context) {
        let mut selected = self.tab;
        let mut toggle = false;

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("NOC Topology");
                    ui.separator();
                    for tab in Tab::ALL {
                        if ui.selectable_label(selected == tab, tab.label()).clicked() {
                            selected = tab;
                        }
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        let next = self.theme.toggled();
                        if ui.button(format!("{} theme", next.label())).clicked() {
                            toggle = true;
                        }
                        ui.label(self.source_label());
                    });
                });
            });

        if toggle {
            self.toggle_theme(ctx);
        }
        self.switch_tab(selected);
    }
}

impl eframe::App for NocTopologyApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        self.draw_top_bar(ctx);
        let now = ctx.input(|input| input.time);

        if let Page::Graph(view) = &mut self.page {
            egui::SidePanel::left("controls")
                .resizable(true)
                .default_width(300.0)
                .show(ctx, |ui| view.draw_controls(ui, now));
        }

        if self.details.is_open() {
            egui::SidePanel::right("details")
                .resizable(true)
                .default_width(320.0)
                .show(ctx, |ui| self.details.draw(ui));
        }

        egui::CentralPanel::default().show(ctx, |ui| match &mut self.page {
            Page::Graph(view) => view.draw_graph(ui, &mut self.details),
            Page::Devices(directory) => directory.draw(ui, &mut self.details),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::fetch::testing::StaticProvider;
    use super::view::ViewPhase;
    use super::*;

    fn app() -> NocTopologyApp {
        NocTopologyApp::with_provider(
            TopologySource::File("topology.json".into()),
            RefreshPolicy::from_secs(0, 0, None),
            Arc::new(StaticProvider::new(r#"{"nodes": [{"id": "PE1", "role": "PE"}]}"#)),
        )
    }

    #[test]
    fn starts_on_topology_tab() {
        let app = app();
        assert_eq!(app.tab, Tab::Topology);
        assert!(matches!(&app.page, Page::Graph(view) if view.kind == ViewKind::Topology));
    }

    #[test]
    fn switching_tabs_replaces_the_page() {
        let mut app = app();

        app.switch_tab(Tab::Path);
        assert!(matches!(&app.page, Page::Graph(view) if view.kind == ViewKind::Path));

        app.switch_tab(Tab::Devices);
        assert!(matches!(app.page, Page::Devices(_)));
    }

    #[test]
    fn reselecting_the_active_tab_keeps_the_view() {
        let mut app = app();
        if let Page::Graph(view) = &mut app.page {
            view.destroy();
        }

        app.switch_tab(Tab::Topology);
        assert!(
            matches!(&app.page, Page::Graph(view) if view.phase() == ViewPhase::Destroyed)
        );
    }

    #[test]
    fn source_label_names_the_backend() {
        assert_eq!(app().source_label(), "file: topology.json");
    }
}
