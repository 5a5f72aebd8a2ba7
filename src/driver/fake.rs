//! In-memory listing page used by pipeline tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Duration;

use async_trait::async_trait;

use super::{DriverError, Session};
use crate::config::{
    FILTER_SEARCH, FILTER_TOGGLE, LOAD_MORE, LOAD_MORE_LABEL, REGION_OPTION, REGION_SELECT,
    RESULT_ITEMS, ROW_CELL,
};

#[derive(Debug, Clone)]
pub enum Node {
    Row(Vec<String>),
    Template(String),
}

#[derive(Debug, Clone)]
pub struct FakeRegion {
    pub nodes: Vec<Node>,
    /// Nodes shown after the search and added by each load-more click.
    pub page_size: usize,
    pub has_load_more: bool,
    /// Button label once every node is shown.
    pub done_label: String,
}

impl FakeRegion {
    /// `rows` data rows, each followed by its template.
    pub fn paired(region: &str, rows: usize, page_size: usize) -> Self {
        let nodes = (0..rows)
            .flat_map(|i| [Node::Row(row_cells(i)), Node::Template(template_html(region, i))])
            .collect();
        FakeRegion {
            nodes,
            page_size,
            has_load_more: true,
            done_label: "No more projects".to_string(),
        }
    }

    pub fn from_nodes(nodes: Vec<Node>) -> Self {
        let page_size = nodes.len();
        FakeRegion {
            nodes,
            page_size,
            has_load_more: false,
            done_label: String::new(),
        }
    }

    pub fn without_load_more(mut self) -> Self {
        self.has_load_more = false;
        self.page_size = self.nodes.len();
        self
    }

}

pub fn row_cells(i: usize) -> Vec<String> {
    vec![
        format!("Flood control structure {i}"),
        "Bulacan".to_string(),
        "ACME BUILDERS".to_string(),
        format!("{},000.00", 100 + i),
        "12/31/2024".to_string(),
        "Report".to_string(),
    ]
}

pub fn template_html(region: &str, i: usize) -> String {
    format!(
        r#"<div class="start-date"><label>Start</label><span>01/15/2024</span></div>
<div class="longi"><label>Coordinates</label><span>(14.5995, 120.9842)</span></div>
<div class="others"><span>Others</span><span>Flood Mitigation Structure</span><span>2024</span></div>
<button class="open-report-form" data-region="{region}" data-contract_id="24A{i:05}">Report</button>"#
    )
}

#[derive(Debug, Clone, PartialEq)]
pub enum FakeElement {
    Toggle,
    RegionSelect,
    RegionOption(usize),
    Search,
    LoadMore,
    Item(usize),
    Cell(usize, usize),
}

#[derive(Default)]
pub struct FakeSession {
    /// Dropdown labels; index 0 is the placeholder.
    pub options: Vec<String>,
    pub regions: HashMap<String, FakeRegion>,
    pub missing_region_select: bool,
    /// The native `<select>` is in the DOM but not visible.
    pub hidden_region_select: bool,
    pub unselectable: HashSet<String>,
    /// Successive load-more clicks; `true` raises an alert instead of loading.
    pub alert_script: VecDeque<bool>,
    pub persistent_alert: bool,
    /// Load-more clicks that succeed before the next one fails outright.
    pub fail_click_after: Option<usize>,

    filters_open: bool,
    chosen: Option<String>,
    active: Option<String>,
    revealed: usize,
    alert: Option<String>,

    pub load_more_clicks: usize,
    pub click_attempts: usize,
    pub refreshes: usize,
    pub alerts_dismissed: usize,
    pub visited: Vec<String>,
}

impl FakeSession {
    pub fn new(regions: Vec<(&str, FakeRegion)>) -> Self {
        let mut options = vec!["All Regions".to_string()];
        options.extend(regions.iter().map(|(name, _)| name.to_string()));
        FakeSession {
            options,
            regions: regions
                .into_iter()
                .map(|(name, region)| (name.to_string(), region))
                .collect(),
            ..Default::default()
        }
    }

    /// Session already showing `region`, as if selected and searched.
    pub fn showing(name: &str, region: FakeRegion) -> Self {
        let mut session = FakeSession::new(vec![(name, region)]);
        session.activate(name.to_string());
        session
    }

    fn activate(&mut self, name: String) {
        self.revealed = self.regions.get(&name).map(|r| r.page_size).unwrap_or(0);
        self.active = Some(name);
    }

    fn current(&self) -> Option<&FakeRegion> {
        self.active.as_ref().and_then(|name| self.regions.get(name))
    }

    fn visible(&self) -> usize {
        self.current()
            .map(|r| self.revealed.min(r.nodes.len()))
            .unwrap_or(0)
    }

    fn node(&self, i: usize) -> Option<&Node> {
        self.current().and_then(|r| r.nodes.get(i))
    }

    fn check_alert(&self) -> Result<(), DriverError> {
        match &self.alert {
            Some(message) => Err(DriverError::UnexpectedAlert(message.clone())),
            None => Ok(()),
        }
    }

    fn locate(&self, selector: &str) -> Option<FakeElement> {
        match selector {
            FILTER_TOGGLE => Some(FakeElement::Toggle),
            REGION_SELECT if self.filters_open && !self.missing_region_select => {
                Some(FakeElement::RegionSelect)
            }
            FILTER_SEARCH if self.filters_open => Some(FakeElement::Search),
            LOAD_MORE if self.current().is_some_and(|r| r.has_load_more) => {
                Some(FakeElement::LoadMore)
            }
            _ => None,
        }
    }
}

#[async_trait]
impl Session for FakeSession {
    type Element = FakeElement;

    async fn navigate(&mut self, url: &str) -> Result<(), DriverError> {
        self.visited.push(url.to_string());
        Ok(())
    }

    async fn find(&self, selector: &str) -> Result<FakeElement, DriverError> {
        self.check_alert()?;
        self.locate(selector)
            .ok_or_else(|| DriverError::NotFound(selector.to_string()))
    }

    async fn find_all(&self, selector: &str) -> Result<Vec<FakeElement>, DriverError> {
        self.check_alert()?;
        if selector != RESULT_ITEMS {
            return Ok(Vec::new());
        }
        Ok((0..self.visible()).map(FakeElement::Item).collect())
    }

    async fn find_within(
        &self,
        parent: &FakeElement,
        selector: &str,
    ) -> Result<Vec<FakeElement>, DriverError> {
        self.check_alert()?;
        Ok(match (parent, selector) {
            (FakeElement::RegionSelect, REGION_OPTION) => {
                (0..self.options.len()).map(FakeElement::RegionOption).collect()
            }
            (FakeElement::Item(i), ROW_CELL) => match self.node(*i) {
                Some(Node::Row(cells)) => {
                    (0..cells.len()).map(|j| FakeElement::Cell(*i, j)).collect()
                }
                _ => Vec::new(),
            },
            _ => Vec::new(),
        })
    }

    async fn wait_for(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<FakeElement, DriverError> {
        self.check_alert()?;
        if selector == REGION_SELECT && self.hidden_region_select {
            return Err(DriverError::Timeout {
                selector: selector.to_string(),
                timeout,
            });
        }
        self.locate(selector).ok_or_else(|| DriverError::Timeout {
            selector: selector.to_string(),
            timeout,
        })
    }

    async fn wait_present(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<FakeElement, DriverError> {
        self.check_alert()?;
        self.locate(selector).ok_or_else(|| DriverError::Timeout {
            selector: selector.to_string(),
            timeout,
        })
    }

    async fn click(&mut self, element: &FakeElement) -> Result<(), DriverError> {
        self.check_alert()?;
        match element {
            FakeElement::Toggle => self.filters_open = true,
            FakeElement::Search => {
                self.filters_open = false;
                if let Some(name) = self.chosen.take() {
                    self.activate(name);
                }
            }
            FakeElement::LoadMore => {
                self.click_attempts += 1;
                if self.fail_click_after == Some(self.load_more_clicks) {
                    return Err(DriverError::Browser("click intercepted".to_string()));
                }
                let alert = self.persistent_alert || self.alert_script.pop_front().unwrap_or(false);
                if alert {
                    let message = "Server is busy, please try again".to_string();
                    self.alert = Some(message.clone());
                    return Err(DriverError::UnexpectedAlert(message));
                }
                let step = self.current().map(|r| r.page_size).unwrap_or(0);
                self.revealed += step;
                self.load_more_clicks += 1;
            }
            _ => {}
        }
        Ok(())
    }

    async fn scroll_into_view(&mut self, _element: &FakeElement) -> Result<(), DriverError> {
        self.check_alert()
    }

    async fn select_option(&mut self, element: &FakeElement, label: &str) -> Result<(), DriverError> {
        self.check_alert()?;
        let known = self.options.iter().skip(1).any(|o| o == label);
        if *element != FakeElement::RegionSelect || !known || self.unselectable.contains(label) {
            return Err(DriverError::NotFound(format!("option `{label}`")));
        }
        self.chosen = Some(label.to_string());
        Ok(())
    }

    async fn tag_name(&self, element: &FakeElement) -> Result<String, DriverError> {
        self.check_alert()?;
        let tag = match element {
            FakeElement::Item(i) => match self.node(*i) {
                Some(Node::Row(_)) => "tr",
                Some(Node::Template(_)) => "template",
                None => return Err(DriverError::NotFound(format!("item {i}"))),
            },
            FakeElement::Cell(..) => "td",
            FakeElement::RegionSelect => "select",
            FakeElement::RegionOption(_) => "option",
            _ => "button",
        };
        Ok(tag.to_string())
    }

    async fn text(&self, element: &FakeElement) -> Result<String, DriverError> {
        self.check_alert()?;
        Ok(match element {
            FakeElement::RegionOption(i) => self.options.get(*i).cloned().unwrap_or_default(),
            FakeElement::LoadMore => match self.current() {
                Some(r) if self.revealed < r.nodes.len() => LOAD_MORE_LABEL.to_string(),
                Some(r) => r.done_label.clone(),
                None => String::new(),
            },
            FakeElement::Cell(i, j) => match self.node(*i) {
                Some(Node::Row(cells)) => cells.get(*j).cloned().unwrap_or_default(),
                _ => String::new(),
            },
            _ => String::new(),
        })
    }

    async fn attribute(&self, _element: &FakeElement, _name: &str) -> Result<Option<String>, DriverError> {
        self.check_alert()?;
        Ok(None)
    }

    async fn inner_html(&self, element: &FakeElement) -> Result<String, DriverError> {
        self.check_alert()?;
        Ok(match element {
            FakeElement::Item(i) => match self.node(*i) {
                Some(Node::Template(html)) => html.clone(),
                _ => String::new(),
            },
            _ => String::new(),
        })
    }

    async fn refresh(&mut self) -> Result<(), DriverError> {
        self.check_alert()?;
        self.refreshes += 1;
        self.filters_open = false;
        self.chosen = None;
        self.active = None;
        self.revealed = 0;
        Ok(())
    }

    async fn dismiss_alert(&mut self) -> Result<(), DriverError> {
        match self.alert.take() {
            Some(_) => {
                self.alerts_dismissed += 1;
                Ok(())
            }
            None => Err(DriverError::NoAlert),
        }
    }

    async fn quit(self) -> Result<(), DriverError> {
        Ok(())
    }
}
