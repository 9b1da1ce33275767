use log::debug;
use rocket::serde::json::{json, Json, Value};
use rocket::State;

use crate::store::{NoteStore, StoreResult};
use crate::structs::{Note, NoteDraft, NoteEnvelope, NoteList, NoteLookup};

pub fn routes() -> Vec<rocket::Route> {
    routes![list_notes, get_note, create_note, update_note, delete_note]
}

#[get("/notes")]
async fn list_notes(store: &State<NoteStore>) -> StoreResult<Json<NoteList>> {
    let notes = store.list().await?;
    Ok(Json(NoteList { notes }))
}

#[get("/notes/<id>")]
async fn get_note(store: &State<NoteStore>, id: i64) -> StoreResult<Json<NoteLookup>> {
    let note = store.get(id).await?;
    if note.is_none() {
        debug!("note {} not found", id);
    }
    Ok(Json(NoteLookup { note }))
}

#[post("/notes", data = "<input>")]
async fn create_note(
    store: &State<NoteStore>,
    input: Json<NoteEnvelope<NoteDraft>>,
) -> StoreResult<Json<NoteEnvelope<Note>>> {
    let note = store.create(input.into_inner().note).await?;
    debug!("created note {}", note.id);
    Ok(Json(NoteEnvelope { note }))
}

// Overwrites unconditionally; the path id wins over any id in the body.
#[put("/notes/<id>", data = "<input>")]
async fn update_note(
    store: &State<NoteStore>,
    id: i64,
    input: Json<NoteEnvelope<NoteDraft>>,
) -> StoreResult<Json<NoteEnvelope<Note>>> {
    let note = input.into_inner().note.into_note(id);
    if !store.update(&note).await? {
        debug!("update matched no note with id {}", id);
    }
    Ok(Json(NoteEnvelope { note }))
}

#[delete("/notes/<id>")]
async fn delete_note(store: &State<NoteStore>, id: i64) -> StoreResult<Value> {
    if !store.delete(id).await? {
        debug!("delete matched no note with id {}", id);
    }
    Ok(json!({}))
}
