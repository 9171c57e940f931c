//! Server-rendered HTML pages
//!
//! Plain string rendering; every dynamic value goes through [`escape`].

use std::fmt::Write;

use crate::aggregate::{ContentFilter, SortKey, SortOrder};
use crate::domain::users::User;
use crate::models::{DashboardCounts, FilterOptions, MediaItem};
use crate::services::flash::Flash;

/// Per-request chrome: who is signed in and which messages to show
#[derive(Debug, Default)]
pub struct PageContext {
    pub username: Option<String>,
    pub is_admin: bool,
    pub flashes: Vec<Flash>,
}

impl PageContext {
    pub fn anonymous(flashes: Vec<Flash>) -> Self {
        Self {
            flashes,
            ..Default::default()
        }
    }

    pub fn for_user(user: &User, is_admin: bool, flashes: Vec<Flash>) -> Self {
        Self {
            username: Some(user.username.clone()),
            is_admin,
            flashes,
        }
    }
}

pub fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn or_na(value: Option<&str>) -> String {
    escape(value.filter(|v| !v.is_empty()).unwrap_or("N/A"))
}

fn layout(title: &str, ctx: &PageContext, body: &str) -> String {
    let mut nav = String::new();
    match &ctx.username {
        Some(username) => {
            nav.push_str(
                r#"<a href="/dashboard">Dashboard</a> <a href="/content">Content</a> <a href="/movies/search">Search</a> <a href="/now_playing">Now Playing</a> <a href="/visualizations/genre_distribution">Genres</a> <a href="/visualizations/playtime_trends">Playtime</a> "#,
            );
            if ctx.is_admin {
                nav.push_str(r#"<a href="/admin/users">Users</a> "#);
            }
            let _ = write!(
                nav,
                r#"<a href="/profile">{}</a> <a href="/logout">Log out</a>"#,
                escape(username)
            );
        }
        None => nav.push_str(r#"<a href="/login">Log in</a> <a href="/register">Register</a>"#),
    }

    let mut flashes = String::new();
    for flash in &ctx.flashes {
        let _ = write!(
            flashes,
            r#"<div class="flash flash-{}">{}</div>"#,
            flash.level.as_str(),
            escape(&flash.message)
        );
    }

    format!(
        r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>
body {{ font-family: sans-serif; margin: 2rem; }}
nav a {{ margin-right: .75rem; }}
table {{ border-collapse: collapse; }}
td, th {{ border: 1px solid #ccc; padding: .25rem .5rem; text-align: left; }}
.flash {{ padding: .5rem; margin: .5rem 0; border-radius: 4px; }}
.flash-success {{ background: #dfd; }} .flash-info {{ background: #def; }}
.flash-warning {{ background: #ffd; }} .flash-danger {{ background: #fdd; }}
.bar {{ background: #4a90d9; height: 1rem; }}
</style>
</head>
<body>
<nav>{nav}</nav>
{flashes}
<h1>{title}</h1>
{body}
</body>
</html>"#,
        title = escape(title),
    )
}

pub fn login_page(ctx: &PageContext) -> String {
    layout(
        "Admin Login",
        ctx,
        r#"<form method="post" action="/login">
<label>Username <input name="username" required></label>
<label>Password <input name="password" type="password" required></label>
<button type="submit">Log in</button>
</form>
<p>No account? <a href="/register">Register</a></p>"#,
    )
}

/// Registration form; echoes the username and server URL, never secrets.
pub fn register_page(ctx: &PageContext, username: &str, plex_baseurl: &str) -> String {
    let body = format!(
        r#"<form method="post" action="/register">
<label>Username <input name="username" value="{}" required></label>
<label>Password <input name="password" type="password" required></label>
<label>Plex URL <input name="plex_baseurl" value="{}"></label>
<label>Plex token <input name="plex_token" type="password"></label>
<button type="submit">Register</button>
</form>"#,
        escape(username),
        escape(plex_baseurl)
    );
    layout("Register", ctx, &body)
}

pub fn dashboard_page(ctx: &PageContext, counts: &DashboardCounts) -> String {
    let body = format!(
        r#"<table>
<tr><th>Users</th><td>{}</td></tr>
<tr><th>Movies</th><td>{}</td></tr>
<tr><th>TV Shows</th><td>{}</td></tr>
<tr><th>Active Sessions</th><td>{}</td></tr>
</table>"#,
        counts.users, counts.movies, counts.tv_shows, counts.active_sessions
    );
    layout("Admin Dashboard", ctx, &body)
}

pub fn users_page(ctx: &PageContext, users: &[User]) -> String {
    let mut rows = String::new();
    for user in users {
        let _ = write!(
            rows,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            user.id,
            escape(&user.username),
            or_na(user.plex_base_url.as_deref()),
            user.created_at.format("%Y-%m-%d %H:%M")
        );
    }
    let body = format!(
        r#"<table id="user-list">
<tr><th>ID</th><th>Username</th><th>Plex URL</th><th>Created</th></tr>
{rows}
</table>"#
    );
    layout("User Management", ctx, &body)
}

pub fn profile_page(ctx: &PageContext, user: &User) -> String {
    let token_state = if user.plex_token.as_deref().is_some_and(|t| !t.is_empty()) {
        "set"
    } else {
        "not set"
    };
    let body = format!(
        r#"<table>
<tr><th>Username</th><td>{}</td></tr>
<tr><th>Plex URL</th><td>{}</td></tr>
<tr><th>Plex token</th><td>{}</td></tr>
<tr><th>Member since</th><td>{}</td></tr>
</table>
<p><a href="/profile/edit">Edit profile</a></p>
<form method="post" action="/profile/delete" onsubmit="return confirm('Delete your account?');">
<button type="submit">Delete account</button>
</form>"#,
        escape(&user.username),
        or_na(user.plex_base_url.as_deref()),
        token_state,
        user.created_at.format("%Y-%m-%d")
    );
    layout("My Profile", ctx, &body)
}

pub fn profile_edit_page(ctx: &PageContext, user: &User) -> String {
    let body = format!(
        r#"<form method="post" action="/profile/edit">
<label>New password <input name="new_password" type="password" placeholder="leave blank to keep"></label>
<label>Plex URL <input name="plex_baseurl" value="{}"></label>
<label>Plex token <input name="plex_token" type="password" placeholder="leave blank to keep"></label>
<label><input name="clear_plex_token" type="checkbox"> Remove stored token</label>
<button type="submit">Save</button>
</form>"#,
        escape(user.plex_base_url.as_deref().unwrap_or_default())
    );
    layout("Edit Profile", ctx, &body)
}

/// Everything the content page needs to render results and keep its
/// filter/sort controls in the state the user left them.
#[derive(Debug, Default)]
pub struct ContentView<'a> {
    pub items: &'a [MediaItem],
    pub options: FilterOptions,
    pub filter: ContentFilter,
    pub sort_by: Option<SortKey>,
    pub sort_order: SortOrder,
}

fn select(name: &str, values: &[String], selected: Option<&str>) -> String {
    let mut html = format!(r#"<select name="{name}"><option value="">Any</option>"#);
    for value in values {
        let sel = if Some(value.as_str()) == selected {
            " selected"
        } else {
            ""
        };
        let v = escape(value);
        let _ = write!(html, r#"<option value="{v}"{sel}>{v}</option>"#);
    }
    html.push_str("</select>");
    html
}

pub fn content_page(ctx: &PageContext, view: &ContentView<'_>) -> String {
    let years: Vec<String> = view.options.years.iter().map(|y| y.to_string()).collect();
    let mut sort_by = String::from(r#"<select name="sort_by">"#);
    for key in [SortKey::Title, SortKey::Year, SortKey::ContentRating] {
        let sel = if view.sort_by == Some(key) { " selected" } else { "" };
        let _ = write!(sort_by, r#"<option value="{0}"{sel}>{0}</option>"#, key.as_str());
    }
    sort_by.push_str("</select>");
    let mut sort_order = String::from(r#"<select name="sort_order">"#);
    for order in [SortOrder::Asc, SortOrder::Desc] {
        let sel = if view.sort_order == order { " selected" } else { "" };
        let _ = write!(sort_order, r#"<option value="{0}"{sel}>{0}</option>"#, order.as_str());
    }
    sort_order.push_str("</select>");

    let mut rows = String::new();
    for item in view.items {
        let _ = write!(
            rows,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            item.kind.as_str(),
            or_na(item.title.as_deref()),
            item.year.map(|y| y.to_string()).unwrap_or_default(),
            or_na(item.content_rating.as_deref()),
            escape(&item.genres.join(", ")),
            escape(item.summary.as_deref().unwrap_or_default()),
        );
    }

    let body = format!(
        r#"<form method="get" action="/content">
Genre {} Year {} Rating {} Sort {} {}
<button type="submit">Apply</button>
</form>
<p>{} items</p>
<table>
<tr><th>Type</th><th>Title</th><th>Year</th><th>Rating</th><th>Genres</th><th>Summary</th></tr>
{rows}
</table>"#,
        select("genre", &view.options.genres, view.filter.genre.as_deref()),
        select("year", &years, view.filter.year.as_deref()),
        select("rating", &view.options.ratings, view.filter.rating.as_deref()),
        sort_by,
        sort_order,
        view.items.len(),
    );
    layout("All Content", ctx, &body)
}

pub fn search_page(ctx: &PageContext, results: &[MediaItem], search_term: &str) -> String {
    let mut rows = String::new();
    for item in results {
        let _ = write!(
            rows,
            "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
            or_na(item.title.as_deref()),
            item.year.map(|y| y.to_string()).unwrap_or_default(),
            escape(item.summary.as_deref().unwrap_or_default()),
        );
    }
    let table = if results.is_empty() {
        String::new()
    } else {
        format!("<table><tr><th>Title</th><th>Year</th><th>Summary</th></tr>{rows}</table>")
    };
    let body = format!(
        r#"<form method="post" action="/movies/search">
<input name="search_term" value="{}" placeholder="Movie title">
<button type="submit">Search</button>
</form>
{table}"#,
        escape(search_term)
    );
    layout("Search Movies", ctx, &body)
}

/// Page shell whose table is filled by polling a JSON endpoint.
fn polling_page(
    title: &str,
    ctx: &PageContext,
    endpoint: &str,
    columns: &[&str],
    interval_ms: u32,
) -> String {
    let headers: String = columns
        .iter()
        .map(|c| format!("<th>{}</th>", escape(c)))
        .collect();
    let keys = serde_json::to_string(columns).unwrap_or_else(|_| "[]".to_string());
    let body = format!(
        r#"<p id="status"></p>
<table><thead><tr>{headers}</tr></thead><tbody id="rows"></tbody></table>
<script>
const columns = {keys};
async function refresh() {{
  const status = document.getElementById('status');
  try {{
    const resp = await fetch('{endpoint}');
    const data = await resp.json();
    if (!resp.ok) {{ status.textContent = data.error || 'Request failed'; return; }}
    status.textContent = data.length === 0 ? 'Nothing to show.' : '';
    const rows = document.getElementById('rows');
    rows.replaceChildren(...data.map(row => {{
      const tr = document.createElement('tr');
      for (const key of columns) {{
        const td = document.createElement('td');
        td.textContent = row[key];
        tr.appendChild(td);
      }}
      return tr;
    }}));
  }} catch (e) {{ status.textContent = 'Request failed'; }}
}}
refresh();
{schedule}
</script>"#,
        schedule = if interval_ms > 0 {
            format!("setInterval(refresh, {interval_ms});")
        } else {
            String::new()
        },
    );
    layout(title, ctx, &body)
}

pub fn now_playing_page(ctx: &PageContext) -> String {
    polling_page(
        "Now Playing",
        ctx,
        "/api/now_playing_data",
        &["user", "player", "content", "type", "progress", "state"],
        5000,
    )
}

pub fn genre_distribution_page(ctx: &PageContext) -> String {
    polling_page(
        "Genre Distribution",
        ctx,
        "/api/genre_distribution_data",
        &["genre", "count"],
        0,
    )
}

pub fn playtime_trends_page(ctx: &PageContext) -> String {
    polling_page(
        "Playtime Trends",
        ctx,
        "/api/playtime_trends_data",
        &["show", "watch_count"],
        0,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape() {
        assert_eq!(
            escape(r#"<b a="1">&'"#),
            "&lt;b a=&quot;1&quot;&gt;&amp;&#39;"
        );
    }

    #[test]
    fn test_register_page_echoes_escaped_fields() {
        let html = register_page(&PageContext::default(), "<eve>", "http://plex");
        assert!(html.contains(r#"value="&lt;eve&gt;""#));
        assert!(html.contains(r#"value="http://plex""#));
    }

    #[test]
    fn test_layout_shows_flashes_and_admin_link() {
        let ctx = PageContext {
            username: Some("admin".into()),
            is_admin: true,
            flashes: vec![Flash::warning("careful")],
        };
        let html = dashboard_page(&ctx, &DashboardCounts::default());
        assert!(html.contains(r#"<div class="flash flash-warning">careful</div>"#));
        assert!(html.contains(r#"href="/admin/users""#));
    }
}
