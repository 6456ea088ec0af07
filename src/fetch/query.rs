use anyhow::Context;
use url::Url;

/// Root of the OECD SDMX-JSON data API.
pub const DEFAULT_BASE_URL: &str = "https://stats.oecd.org/sdmx-json/data";

/// How much of the payload the API should return.
///
/// `DataOnly` strips attribute bookkeeping from the response, which is all
/// the downstream reshaping needs. `Full` is occasionally useful when
/// eyeballing a dataset in a browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Detail {
    #[default]
    DataOnly,
    Full,
}

impl Detail {
    fn as_str(self) -> &'static str {
        match self {
            Detail::DataOnly => "dataonly",
            Detail::Full => "Full",
        }
    }
}

/// A single dataset request against the SDMX-JSON API.
///
/// The path shape is `{base}/{dataset}/{filter}/all`, where `filter` selects
/// dimension members (`.` separated positions, `+` separated members, or
/// `all` for everything). Time bounds and the detail level travel as query
/// parameters.
#[derive(Debug, Clone)]
pub struct DataQuery {
    base_url: String,
    dataset: String,
    dimension_filter: String,
    start_time: Option<String>,
    end_time: Option<String>,
    detail: Detail,
    all_dimensions: bool,
}

impl DataQuery {
    /// Query for `dataset` with no dimension filtering.
    pub fn new(dataset: impl Into<String>) -> Self {
        DataQuery {
            base_url: DEFAULT_BASE_URL.to_string(),
            dataset: dataset.into(),
            dimension_filter: "all".to_string(),
            start_time: None,
            end_time: None,
            detail: Detail::default(),
            all_dimensions: false,
        }
    }

    /// Point the query at a different API root, e.g. a mirror.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Restrict dimension members, e.g. `"AUS+FRA.GDP"`.
    pub fn dimension_filter(mut self, filter: impl Into<String>) -> Self {
        self.dimension_filter = filter.into();
        self
    }

    /// Earliest period to include, e.g. `"2005"` or `"2005-Q1"`.
    pub fn start_time(mut self, start: impl Into<String>) -> Self {
        self.start_time = Some(start.into());
        self
    }

    /// Latest period to include.
    pub fn end_time(mut self, end: impl Into<String>) -> Self {
        self.end_time = Some(end.into());
        self
    }

    pub fn detail(mut self, detail: Detail) -> Self {
        self.detail = detail;
        self
    }

    /// Ask the API for the flat layout, one key per observation.
    pub fn all_dimensions(mut self, flag: bool) -> Self {
        self.all_dimensions = flag;
        self
    }

    pub fn dataset_code(&self) -> &str {
        &self.dataset
    }

    /// Render the final request URL.
    pub fn url(&self) -> anyhow::Result<Url> {
        let joined = format!(
            "{}/{}/{}/all",
            self.base_url.trim_end_matches('/'),
            self.dataset,
            self.dimension_filter
        );
        let mut url = Url::parse(&joined)
            .with_context(|| format!("invalid query URL {joined}"))?;

        {
            let mut pairs = url.query_pairs_mut();
            if let Some(start) = &self.start_time {
                pairs.append_pair("startTime", start);
            }
            if let Some(end) = &self.end_time {
                pairs.append_pair("endTime", end);
            }
            pairs.append_pair("detail", self.detail.as_str());
            if self.all_dimensions {
                pairs.append_pair("dimensionAtObservation", "allDimensions");
            }
        }

        Ok(url)
    }
}
