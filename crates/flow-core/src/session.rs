//! Contexto de sesión que viaja junto a una unidad de trabajo.
//!
//! Permite a componentes anidados descubrir el proceso actual, las
//! propiedades compartidas y el servicio de monitoreo sin búsquedas globales.
//! Todo es inmutable tras la construcción salvo el slot de proceso actual
//! (último escritor gana). La relación con el proceso es débil: la sesión no
//! controla ni prolonga su vida.
use std::fmt;
use std::sync::{Arc, RwLock, Weak};

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde_json::Value;

use crate::sink::{ClientState, NullClientState};
use crate::stats::{CounterKey, StepStats};

static INERT_SERVICES: Lazy<Arc<ManagementServices>> =
    Lazy::new(|| Arc::new(ManagementServices { client_state: Arc::new(NullClientState),
                                               inert: true }));

static NULL_SESSION: Lazy<FlowSession> = Lazy::new(|| FlowSession { id: None,
                                                                    properties: IndexMap::new(),
                                                                    services: None,
                                                                    current_process: RwLock::new(None),
                                                                    inert: true });

/// Servicios de gestión alcanzables desde la sesión (handle de monitoreo).
pub struct ManagementServices {
    client_state: Arc<dyn ClientState>,
    inert: bool,
}

impl ManagementServices {
    pub fn new(client_state: Arc<dyn ClientState>) -> Self {
        Self { client_state,
               inert: false }
    }

    /// Servicios nulos compartidos: el sink descarta todo.
    pub fn inert() -> Arc<ManagementServices> {
        INERT_SERVICES.clone()
    }

    pub fn client_state(&self) -> Arc<dyn ClientState> {
        self.client_state.clone()
    }

    pub fn is_inert(&self) -> bool {
        self.inert
    }
}

impl fmt::Debug for ManagementServices {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagementServices").field("inert", &self.inert).finish()
    }
}

/// Proceso en ejecución (un step corriendo en algún worker).
pub trait FlowProcess: Send + Sync {
    fn id(&self) -> &str;

    fn increment_counter(&self, group: &str, counter: &str, amount: i64);

    /// Sesión en la que corre el proceso, si tiene una.
    fn session(&self) -> Option<Arc<FlowSession>> {
        None
    }

    fn increment(&self, key: &dyn CounterKey, amount: i64) {
        self.increment_counter(key.group(), key.name(), amount);
    }
}

/// Proceso ligado a un `StepStats`: los contadores incrementados por el
/// código de la tarea caen en ese step.
pub struct StepProcess {
    step: Arc<StepStats>,
    session: Arc<FlowSession>,
}

impl StepProcess {
    pub fn new(step: Arc<StepStats>, session: Arc<FlowSession>) -> Self {
        Self { step, session }
    }

    pub fn step(&self) -> &Arc<StepStats> {
        &self.step
    }
}

impl FlowProcess for StepProcess {
    fn id(&self) -> &str {
        crate::stats::Stats::id(self.step.as_ref())
    }

    fn increment_counter(&self, group: &str, counter: &str, amount: i64) {
        self.step.increment(group, counter, amount);
    }

    fn session(&self) -> Option<Arc<FlowSession>> {
        Some(self.session.clone())
    }
}

pub struct FlowSession {
    id: Option<String>,
    properties: IndexMap<String, Value>,
    services: Option<Arc<ManagementServices>>,
    current_process: RwLock<Option<Weak<dyn FlowProcess>>>,
    inert: bool,
}

impl FlowSession {
    pub fn new(services: Arc<ManagementServices>) -> Self {
        Self { id: None,
               properties: IndexMap::new(),
               services: Some(services),
               current_process: RwLock::new(None),
               inert: false }
    }

    /// Instancia nula compartida ("sin sesión"): todo acceso es inerte.
    pub fn null() -> &'static FlowSession {
        &NULL_SESSION
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn with_current_process<P>(self, process: &Arc<P>) -> Self
        where P: FlowProcess + 'static
    {
        self.set_current_process(process);
        self
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn properties(&self) -> &IndexMap<String, Value> {
        &self.properties
    }

    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    /// Servicios configurados o, en su defecto, los servicios inertes.
    pub fn services(&self) -> Arc<ManagementServices> {
        self.services.clone().unwrap_or_else(ManagementServices::inert)
    }

    pub fn is_null(&self) -> bool {
        self.inert
    }

    /// Reemplaza el proceso actual. En la sesión nula es un no-op.
    pub fn set_current_process<P>(&self, process: &Arc<P>)
        where P: FlowProcess + 'static
    {
        if self.inert {
            return;
        }
        let weak: Weak<P> = Arc::downgrade(process);
        let weak: Weak<dyn FlowProcess> = weak;
        *self.current_process.write().unwrap_or_else(|p| p.into_inner()) = Some(weak);
    }

    /// Proceso actual si sigue vivo.
    pub fn current_process(&self) -> Option<Arc<dyn FlowProcess>> {
        self.current_process
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .as_ref()
            .and_then(Weak::upgrade)
    }
}

impl fmt::Debug for FlowSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlowSession")
         .field("id", &self.id)
         .field("properties", &self.properties)
         .field("inert", &self.inert)
         .finish()
    }
}
