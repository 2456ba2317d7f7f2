use std::{
    io::{self, BufRead, Write},
    path::PathBuf,
};

use rand::RngCore;

use crate::{renderers::html_page, service::collection_service::CollectionService};

const MENU: &str = "
Menu
0. Exit
1. List movies
2. Add movie
3. Delete movie
4. Update movie
5. Show statistics
6. Show random movie
7. Search movie by title
8. Show movies sorted by rating
9. Generate and save movie webpage";

/// Numbered command loop over any line-based input and output.
pub struct Menu<'a, R, W> {
    service: &'a mut CollectionService,
    input: R,
    output: W,
    web_file: PathBuf,
    rng: Box<dyn RngCore>,
}

impl<'a, R: BufRead, W: Write> Menu<'a, R, W> {
    pub fn new(
        service: &'a mut CollectionService,
        input: R,
        output: W,
        web_file: PathBuf,
        rng: Box<dyn RngCore>,
    ) -> Self {
        Menu {
            service,
            input,
            output,
            web_file,
            rng,
        }
    }

    /// Runs until the user picks exit or input ends.
    pub async fn run(&mut self) -> io::Result<()> {
        loop {
            writeln!(self.output, "{}", MENU)?;
            let choice = match self.prompt("Enter your choice: ")? {
                Some(choice) => choice,
                None => break,
            };

            match choice.as_str() {
                "0" => {
                    writeln!(self.output, "Exiting the program. Bye!")?;
                    break;
                }
                "1" => self.list()?,
                "2" => {
                    let Some(title) = self.prompt("Enter movie title: ")? else {
                        break;
                    };
                    let message = match self.service.add(&title).await {
                        Ok(added) => added.to_string(),
                        Err(e) => e.to_string(),
                    };
                    writeln!(self.output, "{}", message)?;
                }
                "3" => {
                    let Some(title) = self.prompt("Enter the title of the movie to delete: ")?
                    else {
                        break;
                    };
                    let message = match self.service.delete(&title) {
                        Ok(deleted) => deleted.to_string(),
                        Err(e) => e.to_string(),
                    };
                    writeln!(self.output, "{}", message)?;
                }
                "4" => {
                    let Some(title) = self.prompt("Enter the title of the movie to update: ")?
                    else {
                        break;
                    };
                    let message = match self.service.update(&title).await {
                        Ok(updated) => updated.to_string(),
                        Err(e) => e.to_string(),
                    };
                    writeln!(self.output, "{}", message)?;
                }
                "5" => {
                    let message = match self.service.stats() {
                        Ok(stats) => stats.to_string(),
                        Err(e) => e.to_string(),
                    };
                    writeln!(self.output, "{}", message)?;
                }
                "6" => {
                    let message = match self.service.random_record(&mut *self.rng) {
                        Ok(movie) => format!("Random movie: {}", movie),
                        Err(e) => e.to_string(),
                    };
                    writeln!(self.output, "{}", message)?;
                }
                "7" => {
                    let Some(title) =
                        self.prompt("Enter the title of the movie to search for: ")?
                    else {
                        break;
                    };
                    let message = match self.service.search(&title) {
                        Ok(hit) => hit.to_string(),
                        Err(e) => e.to_string(),
                    };
                    writeln!(self.output, "{}", message)?;
                }
                "8" => self.sorted()?,
                "9" => {
                    let message =
                        match html_page::write_page(self.service.catalog(), &self.web_file) {
                            Ok(()) => format!(
                                "Webpage '{}' has been generated and saved.",
                                self.web_file.display()
                            ),
                            Err(e) => e,
                        };
                    writeln!(self.output, "{}", message)?;
                }
                _ => writeln!(self.output, "Invalid choice. Please try again.")?,
            }
        }

        self.output.flush()
    }

    /// Returns the trimmed line, or `None` once input is exhausted.
    fn prompt(&mut self, text: &str) -> io::Result<Option<String>> {
        write!(self.output, "{}", text)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn list(&mut self) -> io::Result<()> {
        let movies = self.service.list();
        if movies.is_empty() {
            return writeln!(self.output, "No movies in the list.");
        }

        writeln!(self.output, "{} movies in total", movies.len())?;
        for movie in movies {
            writeln!(self.output, "{}", movie)?;
        }
        Ok(())
    }

    fn sorted(&mut self) -> io::Result<()> {
        let movies = self.service.sorted_by_rating();
        if movies.is_empty() {
            return writeln!(self.output, "No movies to sort.");
        }

        for movie in movies {
            writeln!(self.output, "{}", movie.headline())?;
        }
        Ok(())
    }
}
