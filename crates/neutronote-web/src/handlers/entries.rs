//! Timeline pages: index split view, tag filter, detail, edit, delete and
//! notebook setup.

use axum::{
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Response},
    Form,
};
use axum_extra::extract::cookie::CookieJar;
use minijinja::context;
use neutronote_common::{ApiError, Ipts};
use neutronote_db::{Entry, EntryType};
use serde::Deserialize;
use tracing::{info, warn};

use crate::flash;
use crate::handlers::{non_blank, to_index, TABS};
use crate::state::SharedState;
use crate::templates::EntryView;

#[derive(Debug, Deserialize, Default)]
pub struct IndexQuery {
    pub tab: Option<String>,
}

fn active_tab(query: &IndexQuery) -> &'static str {
    query
        .tab
        .as_deref()
        .and_then(|t| TABS.iter().find(|&&name| name == t))
        .copied()
        .unwrap_or("text")
}

async fn render_timeline(
    state: &SharedState,
    jar: CookieJar,
    entries: Vec<Entry>,
    tab: &str,
    filter_tag: Option<String>,
) -> Result<(CookieJar, Html<String>), ApiError> {
    let config = state.notebook_config().await?;
    let tags = state.tags.list_with_counts().await?;
    let (jar, messages) = flash::take(jar);
    let entries: Vec<EntryView> = entries.into_iter().map(EntryView::from).collect();

    let html = state.templates.render(
        "entries/index.html",
        context! {
            entries => entries,
            config => config,
            tags => tags,
            active_tab => tab,
            filter_tag => filter_tag,
            messages => messages,
        },
    )?;
    Ok((jar, Html(html)))
}

/// Main split view: create panel on the left, timeline on the right.
pub async fn index(
    State(state): State<SharedState>,
    Query(query): Query<IndexQuery>,
    jar: CookieJar,
) -> Result<(CookieJar, Html<String>), ApiError> {
    let entries = state.entries.list_timeline().await?;
    render_timeline(&state, jar, entries, active_tab(&query), None).await
}

/// Timeline restricted to entries carrying one hashtag.
pub async fn by_tag(
    State(state): State<SharedState>,
    Path(name): Path<String>,
    jar: CookieJar,
) -> Result<(CookieJar, Html<String>), ApiError> {
    let name = name.trim_start_matches('#').to_lowercase();
    let entries = state.entries.list_by_tag(&name).await?;
    render_timeline(&state, jar, entries, "text", Some(name)).await
}

async fn load_entry(state: &SharedState, id: i64) -> Result<Entry, ApiError> {
    state
        .entries
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Entry {id} not found")))
}

pub async fn detail(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Html<String>, ApiError> {
    let entry = EntryView::from(load_entry(&state, id).await?);
    let html = state
        .templates
        .render("entries/detail.html", context! { entry => entry })?;
    Ok(Html(html))
}

pub async fn edit_page(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    let entry = load_entry(&state, id).await?;
    if !entry.entry_type.is_editable() {
        return Ok(to_index(None).into_response());
    }
    let html = state
        .templates
        .render("entries/edit.html", context! { entry => EntryView::from(entry) })?;
    Ok(Html(html).into_response())
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct EditForm {
    pub title: String,
    pub body: String,
    pub edited_by: String,
}

pub async fn edit_submit(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Form(form): Form<EditForm>,
) -> Result<Response, ApiError> {
    let entry = load_entry(&state, id).await?;
    if !entry.entry_type.is_editable() {
        return Ok(to_index(None).into_response());
    }
    if let Some(body) = non_blank(&form.body) {
        let title = non_blank(&form.title);
        let edited_by = non_blank(&form.edited_by);
        state
            .entries
            .update_content(id, title.as_deref(), &body, edited_by.as_deref())
            .await?;
    }
    Ok(to_index(None).into_response())
}

pub async fn delete(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    let Some(entry) = state.entries.delete(id).await? else {
        return Err(ApiError::NotFound(format!("Entry {id} not found")));
    };
    if entry.entry_type == EntryType::Image && is_plain_filename(&entry.body) {
        let path = state.upload_dir.join(&entry.body);
        if let Err(e) = tokio::fs::remove_file(&path).await {
            warn!(path = %path.display(), error = %e, "could not remove uploaded image");
        }
    }
    Ok(to_index(None).into_response())
}

/// Upload names are generated server side; anything with a path
/// component did not come from us.
fn is_plain_filename(name: &str) -> bool {
    !name.is_empty() && !name.contains(['/', '\\']) && name != "." && name != ".."
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct SetupForm {
    pub ipts: String,
    pub notebook_title: String,
}

/// Point the notebook at an IPTS whose folder exists in the data tree.
pub async fn setup(
    State(state): State<SharedState>,
    jar: CookieJar,
    Form(form): Form<SetupForm>,
) -> Result<(CookieJar, Response), ApiError> {
    let ipts = match Ipts::parse(&form.ipts) {
        Ok(ipts) => ipts,
        Err(e) => return Ok((flash::error(jar, e.to_string()), to_index(None).into_response())),
    };

    let ipts_path = state.snap.layout().ipts_dir(ipts.as_str());
    if !tokio::fs::try_exists(&ipts_path).await.unwrap_or(false) {
        let message = format!("IPTS folder not found: {}", ipts_path.display());
        return Ok((flash::error(jar, message), to_index(None).into_response()));
    }

    let title = non_blank(&form.notebook_title);
    state.notebook.configure(ipts.as_str(), title.as_deref()).await?;
    info!(%ipts, "notebook setup from the web form");
    let jar = flash::success(jar, format!("Notebook configured for {ipts}"));
    Ok((jar, to_index(None).into_response()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_tab_defaults_to_text() {
        assert_eq!(active_tab(&IndexQuery::default()), "text");
        assert_eq!(active_tab(&IndexQuery { tab: Some("code".into()) }), "code");
        assert_eq!(active_tab(&IndexQuery { tab: Some("video".into()) }), "text");
    }

    #[test]
    fn test_plain_filename() {
        assert!(is_plain_filename("3f2a.png"));
        assert!(!is_plain_filename("../neutronote.db"));
        assert!(!is_plain_filename(""));
    }
}
