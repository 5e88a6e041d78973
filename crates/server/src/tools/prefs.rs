//! favorites and theme tool implementations.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shelter_core::prefs::{AnimeRecord, Favorites, StaticCatalog, Theme, ThemeStore};

use crate::error::ToolError;
use crate::tools::json_result;

/// Parameters for the favorites tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FavoritesParams {
    /// One of "list", "add", "remove", "toggle", "check", "resolve".
    pub action: String,

    /// Anime id (required for add, remove, toggle and check).
    #[serde(default)]
    pub id: Option<u32>,

    /// Catalog to look favorites up in ("resolve" only).
    #[serde(default)]
    pub catalog: Option<Vec<AnimeRecord>>,
}

/// Output from the favorites tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FavoritesOutput {
    pub favorites: Vec<u32>,
    /// Whether the action changed the list (add/remove) or the id is now a
    /// favorite (toggle/check).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<bool>,
    /// Catalog records of the favorites, in list order ("resolve" only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records: Option<Vec<AnimeRecord>>,
}

/// Implementation of the favorites tool.
pub async fn favorites_impl(favorites: &Favorites, params: FavoritesParams) -> Result<CallToolResult, McpError> {
    let id = || params.id.ok_or_else(|| ToolError::InvalidInput(format!("{} requires an id", params.action)));

    if params.action == "resolve" {
        let records = params.catalog.clone().unwrap_or_default();
        let records = favorites.resolve(&StaticCatalog::new(records)).await;
        return json_result(&FavoritesOutput { favorites: favorites.all().await, result: None, records: Some(records) });
    }

    let result = match params.action.as_str() {
        "list" => None,
        "add" => Some(favorites.add(id()?).await?),
        "remove" => Some(favorites.remove(id()?).await?),
        "toggle" => Some(favorites.toggle(id()?).await?),
        "check" => Some(favorites.is_favorite(id()?).await),
        other => return Err(ToolError::UnknownAction { tool: "favorites", action: other.to_string() }.into()),
    };

    json_result(&FavoritesOutput { favorites: favorites.all().await, result, records: None })
}

/// Parameters for the theme tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ThemeParams {
    /// One of "get", "set", "toggle", "initial".
    pub action: String,

    /// "dark" or "light" (set only).
    #[serde(default)]
    pub theme: Option<String>,

    /// Whether the system asks for a dark color scheme ("initial" only).
    #[serde(default)]
    pub system_prefers_dark: Option<bool>,
}

/// Output from the theme tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ThemeOutput {
    pub theme: Theme,
    /// Browser chrome color for the theme.
    pub meta_color: String,
}

/// Implementation of the theme tool.
pub async fn theme_impl(themes: &ThemeStore, params: ThemeParams) -> Result<CallToolResult, McpError> {
    let theme = match params.action.as_str() {
        "get" => themes.current().await?,
        "set" => {
            let requested = params.theme.as_deref().unwrap_or_default();
            let theme = Theme::parse(requested)
                .ok_or_else(|| ToolError::InvalidInput(format!("unknown theme '{requested}'")))?;
            themes.set(theme).await?;
            theme
        }
        "toggle" => themes.toggle().await?,
        "initial" => themes.initial(params.system_prefers_dark).await?,
        other => return Err(ToolError::UnknownAction { tool: "theme", action: other.to_string() }.into()),
    };

    json_result(&ThemeOutput { theme, meta_color: theme.meta_color().to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::testing::{output, state};

    fn favorite(action: &str, id: Option<u32>) -> FavoritesParams {
        FavoritesParams { action: action.into(), id, catalog: None }
    }

    fn theme(action: &str, theme: Option<&str>, system_prefers_dark: Option<bool>) -> ThemeParams {
        ThemeParams { action: action.into(), theme: theme.map(String::from), system_prefers_dark }
    }

    #[tokio::test]
    async fn test_favorites_actions() {
        let (state, _) = state().await;

        let value = output(&favorites_impl(&state.favorites, favorite("add", Some(7))).await.unwrap());
        assert_eq!(value["result"], true);
        let value = output(&favorites_impl(&state.favorites, favorite("add", Some(7))).await.unwrap());
        assert_eq!(value["result"], false);
        assert_eq!(value["favorites"], serde_json::json!([7]));

        let value = output(&favorites_impl(&state.favorites, favorite("toggle", Some(3))).await.unwrap());
        assert_eq!(value["favorites"], serde_json::json!([7, 3]));

        let value = output(&favorites_impl(&state.favorites, favorite("remove", Some(7))).await.unwrap());
        assert_eq!(value["favorites"], serde_json::json!([3]));

        let value = output(&favorites_impl(&state.favorites, favorite("list", None)).await.unwrap());
        assert!(value.get("result").is_none());
    }

    #[tokio::test]
    async fn test_favorites_requires_id() {
        let (state, _) = state().await;
        assert!(favorites_impl(&state.favorites, favorite("add", None)).await.is_err());
        assert!(favorites_impl(&state.favorites, favorite("star", Some(1))).await.is_err());
    }

    #[tokio::test]
    async fn test_theme_actions() {
        let (state, _) = state().await;

        let get = theme("get", None, None);
        assert_eq!(output(&theme_impl(&state.themes, get).await.unwrap())["theme"], "dark");

        let value = output(&theme_impl(&state.themes, theme("toggle", None, None)).await.unwrap());
        assert_eq!(value["theme"], "light");
        assert_eq!(value["meta_color"], "#f5f5f5");

        let set = theme("set", Some("dark"), None);
        assert_eq!(output(&theme_impl(&state.themes, set).await.unwrap())["theme"], "dark");

        assert!(theme_impl(&state.themes, theme("set", Some("sepia"), None)).await.is_err());
    }

    #[tokio::test]
    async fn test_theme_initial_follows_system_until_saved() {
        let (state, _) = state().await;

        let value = output(&theme_impl(&state.themes, theme("initial", None, Some(true))).await.unwrap());
        assert_eq!(value["theme"], "dark");
        let value = output(&theme_impl(&state.themes, theme("initial", None, None)).await.unwrap());
        assert_eq!(value["theme"], "light");

        theme_impl(&state.themes, theme("set", Some("light"), None)).await.unwrap();
        let value = output(&theme_impl(&state.themes, theme("initial", None, Some(true))).await.unwrap());
        assert_eq!(value["theme"], "light");
    }

    #[tokio::test]
    async fn test_favorites_resolve_against_catalog() {
        let (state, _) = state().await;
        favorites_impl(&state.favorites, favorite("add", Some(2))).await.unwrap();
        favorites_impl(&state.favorites, favorite("add", Some(99))).await.unwrap();

        let catalog = serde_json::from_value(serde_json::json!([
            {"id": 2, "imagem": "img/2.jpg", "titulo": "Two", "episodiosTotal": 12, "status": "Completo"}
        ]))
        .unwrap();
        let params = FavoritesParams { action: "resolve".into(), id: None, catalog: Some(catalog) };
        let value = output(&favorites_impl(&state.favorites, params).await.unwrap());

        assert_eq!(value["favorites"], serde_json::json!([2, 99]));
        assert_eq!(value["records"][0]["titulo"], "Two");
        assert_eq!(value["records"].as_array().unwrap().len(), 1);
    }
}
