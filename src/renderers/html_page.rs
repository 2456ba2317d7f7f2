use std::{fmt::Write as _, fs, path::Path};

use crate::model::{catalog::Catalog, movie::MovieRecord};

const PAGE_HEAD: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>My Movie App</title>
    <link rel="stylesheet" href="style.css"/>
</head>
<body>
<div class="list-movies-title">
    <h1>My Movie Collection</h1>
</div>
<div>
    <ul class="movie-grid">
"#;

const PAGE_TAIL: &str = r#"    </ul>
</div>
</body>
</html>
"#;

pub fn format_rating(rating: Option<f64>) -> String {
    match rating {
        Some(r) => format!("{:.1}", r),
        None => "Not Available".to_string(),
    }
}

fn html_escape(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn render_movie(out: &mut String, movie: &MovieRecord) {
    let title = html_escape(&movie.title);
    let poster = match &movie.poster {
        Some(url) => format!(
            r#"<img src="{}" alt="{} poster" class="movie-poster"/>"#,
            html_escape(url),
            title
        ),
        None => r#"<div class="no-poster">No Image Available</div>"#.to_string(),
    };

    // Writing to a String cannot fail.
    let _ = write!(
        out,
        r#"        <li class="movie-item">
            <div class="movie-info">
                {poster}
                <h2 class="movie-title">{title}</h2>
                <p class="movie-year"><strong>Year:</strong> {year}</p>
                <p class="movie-rating"><strong>Rating:</strong> {rating}</p>
                <p class="movie-actors"><strong>Actors:</strong> {actors}</p>
            </div>
        </li>
"#,
        poster = poster,
        title = title,
        year = html_escape(&movie.year),
        rating = format_rating(movie.rating),
        actors = html_escape(&movie.actors),
    );
}

/// Renders the whole catalog as a standalone HTML document.
pub fn render_page(catalog: &Catalog) -> String {
    let mut html = String::from(PAGE_HEAD);
    for movie in catalog.records() {
        render_movie(&mut html, movie);
    }
    html.push_str(PAGE_TAIL);
    html
}

pub fn write_page(catalog: &Catalog, path: &Path) -> Result<(), String> {
    if catalog.is_empty() {
        return Err("No movies available to generate a webpage.".to_string());
    }

    if let Err(e) = fs::write(path, render_page(catalog)) {
        return Err(format!(
            "Error when writing webpage {}. {:?}",
            path.display(),
            e
        ));
    }

    log::info!("Webpage '{}' has been generated and saved.", path.display());
    Ok(())
}
