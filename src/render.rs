use maud::{DOCTYPE, Markup, PreEscaped, html};

use crate::builtin;
use crate::view::ViewState;

/// One post card. Pure mapping of the four display fields; every field is escaped.
pub fn render_post(img: &str, name: &str, time: &str, text: &str) -> Markup {
    html! {
        article class="pf-post" {
            header class="pf-post-header" {
                @if !img.is_empty() {
                    img class="pf-post-img" width="48" height="48" src=(img) alt=(name);
                }
                div class="pf-post-meta" {
                    span class="pf-post-name" { (name) }
                    @if !time.is_empty() {
                        span class="pf-post-time" { (time) }
                    }
                }
            }
            p class="pf-post-text" { (text) }
        }
    }
}

pub fn render_page(title: &str, state: &ViewState) -> String {
    let post_count = state.posts.len();

    let markup: Markup = html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                meta name="color-scheme" content="light dark";
                title { (title) }
                style { (PreEscaped(builtin::BUILTIN_CSS)) }
            }
            body class="pf" {
                header class="pf-topbar" {
                    div class="pf-container" {
                        h1 { (title) }
                    }
                }
                main class="pf-container pf-main" {
                    @if state.loading {
                        div class="pf-loading" { "Loading posts..." }
                    } @else if let Some(error) = &state.error {
                        div class="pf-error" role="alert" { (error) }
                    } @else {
                        @for post in state.posts.iter() {
                            (render_post(&post.img, &post.name, &post.time, &post.text))
                        }
                    }
                }
                footer class="pf-footer" {
                    div class="pf-container" {
                        "Posts: " (post_count)
                    }
                }
            }
        }
    };
    markup.into_string()
}
